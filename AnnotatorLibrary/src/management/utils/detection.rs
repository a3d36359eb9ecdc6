use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Detection {
    pub name: String,
    pub confidence: f64,
}
