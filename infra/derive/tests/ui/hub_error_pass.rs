use hub_derive::hub_error;
use std::borrow::Cow;

#[hub_error]
pub enum ManifestError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read(path: &str) -> Result<String, ManifestError> {
    std::fs::read_to_string(path).context("Reading manifest")
}

fn main() {
    let _ = read("missing.toml");
    let _: ManifestError = "boom".into();
    let _: ManifestError = String::from("boom").into();
}
