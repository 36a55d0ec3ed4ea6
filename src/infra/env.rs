use crate::domain::AiError;

pub(crate) fn read_env_var(name: &str) -> Result<Option<String>, AiError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(AiError::config(format!("{name} could not be read: {error}"))),
    }
}

pub(crate) fn parse_timeout_seconds(name: &str, value: &str) -> Result<u64, AiError> {
    let parsed = value
        .trim()
        .parse::<u64>()
        .map_err(|_| AiError::config(format!("{name} must be a positive integer in seconds")))?;
    if parsed == 0 {
        return Err(AiError::config(format!(
            "{name} must be greater than 0 seconds"
        )));
    }
    Ok(parsed)
}

pub(crate) fn parse_max_tokens(name: &str, value: &str) -> Result<u32, AiError> {
    let parsed = value
        .trim()
        .parse::<u32>()
        .map_err(|_| AiError::config(format!("{name} must be a positive integer")))?;
    if parsed == 0 {
        return Err(AiError::config(format!("{name} must be greater than 0")));
    }
    Ok(parsed)
}
