use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "engine": {
                "type": "object",
                "properties": {
                    "binary": { "type": "string" },
                    "query": { "type": "string" },
                    "language": { "type": "string", "enum": ["python", "go", "java", "javascript", "ruby"] },
                    "stage_timeout_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "scan": {
                "type": "object",
                "properties": {
                    "data_root": { "type": "string" },
                    "database_dir": { "type": "string" },
                    "concurrency": { "type": "integer", "minimum": 1 }
                }
            },
            "output": {
                "type": "object",
                "properties": {
                    "directory": { "type": "string" }
                }
            }
        }
    })
});
