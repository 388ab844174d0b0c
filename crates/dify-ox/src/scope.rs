/// Which of the two Dify API keys a request is signed with.
///
/// App endpoints (chat, completion, conversations) take the app key, knowledge
/// base endpoints take the dataset key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::AsRefStr)]
pub enum ApiScope {
    #[default]
    Chat,
    Dataset,
}

impl From<&str> for ApiScope {
    /// Unrecognized tags resolve to [`ApiScope::Chat`].
    fn from(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("dataset") {
            ApiScope::Dataset
        } else {
            ApiScope::Chat
        }
    }
}
