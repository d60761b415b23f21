/// One remediation attempt for a blocked search. `AltSearchEngine::engine`
/// is drawn from a closed allowed-set enforced by `fallback-chooser`'s
/// policy, never by this type.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde-full",
    serde(tag = "type", rename_all = "snake_case")
)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FallbackStrategy {
    AltSearchEngine { engine: String },
    SiteScoped { site: String, query: String },
    CacheLookup { query: String },
}
