use serde::Serialize;

use crate::domain::WizardId;

/// A wizard together with the number of artifacts it currently owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wizard {
    pub id: WizardId,
    pub name: String,
    pub number_of_artifacts: u64,
}

#[derive(Debug, Clone)]
pub struct WizardInput {
    pub name: String,
}
