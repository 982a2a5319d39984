use serde::Deserialize;

#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum ConfigLoadError {
    /// Failed to parse JSON config: {0:#?}
    JsonParse(serde_json::Error),
}

impl From<serde_json::Error> for ConfigLoadError {
    fn from(value: serde_json::Error) -> Self {
        Self::JsonParse(value)
    }
}

/// Options for a single run of the pass
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the program entry point, its signature is fixed by the
    /// execution environment so it is never rewritten
    pub entry_point: String,
    /// Appended to the name of a function to name its replacement
    pub suffix: String,
    /// Run the validator over the transformed module before committing it
    pub validate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry_point: "main".to_owned(),
            suffix: "_new".to_owned(),
            validate: true,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use {super::Config, pretty_assertions::assert_eq};

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let config = Config::from_json(r#"{ "entry_point": "start", "validate": false }"#).unwrap();

        assert_eq!(
            config,
            Config {
                entry_point: "start".to_owned(),
                suffix: "_new".to_owned(),
                validate: false,
            }
        );
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(Config::from_json(r#"{ "entrypoint": "start" }"#).is_err());
    }
}
