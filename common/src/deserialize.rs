use serde::{Deserialize, Deserializer, de::Error};
use tracing::debug;

pub fn disallow_empty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let input_string: Option<String> = Option::deserialize(deserializer)?;

    let Some(query_string) = input_string else {
        return Err(Error::custom("field is not a string"));
    };

    if query_string.is_empty() {
        return Err(Error::custom("field is empty"));
    }

    Ok(query_string)
}

// query strings coming from older clients send `True`/`False`,
// a bare `?resize` (empty value) counts as false
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let input_string = String::deserialize(deserializer)?;
    let trimmed = input_string.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("false") {
        return Ok(false);
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(true);
    }

    debug!("Invalid boolean: {:?}", input_string);

    Err(Error::custom("invalid boolean"))
}

// same idea for numbers, `?width` with no value falls back to 0
pub fn lenient_width<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let input_string = String::deserialize(deserializer)?;
    let trimmed = input_string.trim();

    if trimmed.is_empty() {
        return Ok(0);
    }

    trimmed.parse::<u16>().map_err(|_| {
        debug!("Invalid width: {:?}", input_string);
        Error::custom("invalid width")
    })
}
