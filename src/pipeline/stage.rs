use crate::models::Stage;

pub struct StageDefinition {
    pub stage: Stage,
    pub display_name: &'static str,
}

/// Pipeline stages in execution order.
pub static STAGES: &[StageDefinition] = &[
    StageDefinition {
        stage: Stage::DatabaseCreate,
        display_name: "Database",
    },
    StageDefinition {
        stage: Stage::QueryRun,
        display_name: "Query",
    },
    StageDefinition {
        stage: Stage::Decode,
        display_name: "Decode",
    },
];

pub fn display_name(stage: Stage) -> &'static str {
    STAGES
        .iter()
        .find(|s| s.stage == stage)
        .map(|s| s.display_name)
        .unwrap_or("Unknown")
}
