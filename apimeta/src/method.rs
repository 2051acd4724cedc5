//! HTTP methods an API can be declared with.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// HTTP method of a declared API.
///
/// The method is stored in every request description under the `method` key
/// in its uppercase form and parsed back case-insensitively by transports.
///
/// ## Examples
///
/// ```rust
/// use apimeta::RestMethod;
///
/// assert_eq!(RestMethod::Get.as_str(), "GET");
///
/// let parsed: RestMethod = "post".parse().unwrap();
/// assert_eq!(parsed, RestMethod::Post);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RestMethod {
    /// HTTP GET - Retrieve a resource.
    Get,
    /// HTTP POST - Create a resource or trigger an action.
    Post,
    /// HTTP PUT - Replace a resource entirely.
    Put,
    /// HTTP PATCH - Partially update a resource.
    Patch,
    /// HTTP DELETE - Remove a resource.
    Delete,
    /// HTTP HEAD - Retrieve headers only.
    Head,
    /// HTTP OPTIONS - Query supported methods.
    Options,
    /// HTTP TRACE - Echo the request for debugging.
    Trace,
}

impl RestMethod {
    /// Returns the uppercase method name.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Converts to the equivalent `reqwest::Method`.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
            Self::Trace => reqwest::Method::TRACE,
        }
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        method.to_reqwest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_display() {
        assert_eq!(RestMethod::Get.to_string(), "GET");
        assert_eq!(RestMethod::Delete.to_string(), "DELETE");
        assert_eq!(RestMethod::Patch.as_str(), "PATCH");
    }

    #[test]
    fn test_parse_any_case() {
        assert_eq!("GET".parse::<RestMethod>().unwrap(), RestMethod::Get);
        assert_eq!("get".parse::<RestMethod>().unwrap(), RestMethod::Get);
        assert_eq!("Delete".parse::<RestMethod>().unwrap(), RestMethod::Delete);
        assert!("FETCH".parse::<RestMethod>().is_err());
    }

    #[test]
    fn test_round_trip_every_method() {
        for method in RestMethod::iter() {
            assert_eq!(method.as_str().parse::<RestMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_to_reqwest() {
        assert_eq!(RestMethod::Get.to_reqwest(), reqwest::Method::GET);
        assert_eq!(reqwest::Method::from(RestMethod::Head), reqwest::Method::HEAD);
    }
}
