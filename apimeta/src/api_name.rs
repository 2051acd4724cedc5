use std::fmt;

/// A validated API name.
///
/// API names are looked up by callers the way a function would be, so they
/// follow identifier rules:
/// 1. Must start with an alphabetic character or `_`.
/// 2. Remaining characters must be alphanumeric or `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiName(String);

#[derive(Debug, PartialEq, Eq)]
pub enum ApiNameError {
    Empty,
    InvalidStartCharacter(char),
    InvalidCharacter(char),
}

impl fmt::Display for ApiNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "api name cannot be empty"),
            Self::InvalidStartCharacter(c) => {
                write!(f, "api name cannot start with '{}'", c)
            }
            Self::InvalidCharacter(c) => write!(f, "api name contains invalid character: '{}'", c),
        }
    }
}

impl std::error::Error for ApiNameError {}

impl ApiName {
    /// Creates a new ApiName, validating identifier rules.
    pub fn new<S: Into<String>>(name: S) -> Result<Self, ApiNameError> {
        let s = name.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), ApiNameError> {
        let mut chars = s.chars();

        match chars.next() {
            None => return Err(ApiNameError::Empty),
            Some(c) if !(c.is_alphabetic() || c == '_') => {
                return Err(ApiNameError::InvalidStartCharacter(c))
            }
            _ => {}
        }

        if let Some(c) = chars.find(|c| !c.is_alphanumeric() && *c != '_') {
            return Err(ApiNameError::InvalidCharacter(c));
        }

        Ok(())
    }

    /// Returns a string slice reference
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ApiName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ApiName> for String {
    fn from(name: ApiName) -> Self {
        name.0
    }
}

impl TryFrom<String> for ApiName {
    type Error = ApiNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ApiName {
    type Error = ApiNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(ApiName::new("get_user").is_ok());
        assert!(ApiName::new("_private_call").is_ok());
        assert!(ApiName::new("v2Items").is_ok());
    }

    #[test]
    fn test_invalid_start() {
        assert_eq!(
            ApiName::new("1st"),
            Err(ApiNameError::InvalidStartCharacter('1'))
        );
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            ApiName::new("get-user"),
            Err(ApiNameError::InvalidCharacter('-'))
        );
        assert_eq!(
            ApiName::new("get user"),
            Err(ApiNameError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(ApiName::new(""), Err(ApiNameError::Empty));
    }

    #[test]
    fn test_traits() {
        let name: ApiName = "list_repos".try_into().unwrap();
        assert_eq!(name.to_string(), "list_repos");
        let s: String = name.into();
        assert_eq!(s, "list_repos");
    }
}
