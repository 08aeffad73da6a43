use crate::errors::HnpError;

/// Config values end up as process arguments; shell syntax in them is always a mistake.
const SHELL_PATTERNS: &[&str] = &[
    ";",
    "&&",
    "||",
    "|",
    "`",
    "$(",
    "\n",
    "\0",
];

pub fn validate_shell_patterns(value: &serde_yaml::Value) -> Result<(), HnpError> {
    check_value(value, &[])
}

fn check_value(value: &serde_yaml::Value, path: &[String]) -> Result<(), HnpError> {
    match value {
        serde_yaml::Value::String(s) => {
            for pattern in SHELL_PATTERNS {
                if s.contains(pattern) {
                    let path_str = if path.is_empty() { "root".to_string() } else { path.join(".") };
                    return Err(HnpError::Config(format!(
                        "Shell syntax {:?} found at config path: {}",
                        pattern, path_str
                    )));
                }
            }
            Ok(())
        }
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = k.as_str().unwrap_or("unknown").to_string();
                let mut new_path = path.to_vec();
                new_path.push(key);
                check_value(v, &new_path)?;
            }
            Ok(())
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let mut new_path = path.to_vec();
                new_path.push(format!("[{}]", i));
                check_value(v, &new_path)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
