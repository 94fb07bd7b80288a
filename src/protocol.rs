use serde::{Deserialize, Serialize};

use crate::resilience::{
    CombinationSet, EngineError, EngineErrorKind, Operator, Requirement, Tier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ResponseCode {
    Success,
    MalformedRequest,
    NoOperators,
    NonPositiveBandwidth,
    TooManyOperators,
    ComputationFailed,
}

impl ResponseCode {
    pub fn as_u16(self) -> u16 {
        match self {
            ResponseCode::Success => 200,
            ResponseCode::NoOperators => 301,
            ResponseCode::NonPositiveBandwidth => 302,
            ResponseCode::TooManyOperators => 303,
            ResponseCode::MalformedRequest => 400,
            ResponseCode::ComputationFailed => 500,
        }
    }
}

impl From<ResponseCode> for u16 {
    fn from(code: ResponseCode) -> Self {
        code.as_u16()
    }
}

impl TryFrom<u16> for ResponseCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            200 => Ok(ResponseCode::Success),
            301 => Ok(ResponseCode::NoOperators),
            302 => Ok(ResponseCode::NonPositiveBandwidth),
            303 => Ok(ResponseCode::TooManyOperators),
            400 => Ok(ResponseCode::MalformedRequest),
            500 => Ok(ResponseCode::ComputationFailed),
            other => Err(format!("unknown response code {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRecord {
    #[serde(rename = "ErrorCode")]
    pub code: ResponseCode,
    #[serde(rename = "ErrorMessage")]
    pub message: String,
}

impl ControlRecord {
    pub fn new(code: ResponseCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(ResponseCode::Success, "Success")
    }

    pub fn malformed(cause: impl std::fmt::Display) -> Self {
        Self::new(
            ResponseCode::MalformedRequest,
            format!("Malformed request - {cause}"),
        )
    }

    pub fn computation_failed(cause: impl std::fmt::Display) -> Self {
        Self::new(
            ResponseCode::ComputationFailed,
            format!("Error in computing resiliency combinations - {cause}"),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CombinationRequest {
    pub operators: Vec<Operator>,
    pub required_bandwidth: f64,
    pub resiliency_level: serde_json::Number,
}

impl CombinationRequest {
    /// Integral levels, including `2.0`, select a tier; fractional levels
    /// read as Low.
    pub fn tier(&self) -> Tier {
        match integral_level(&self.resiliency_level) {
            Some(level) => Tier::from_level(level),
            None => Tier::Low,
        }
    }

    pub fn requirement(&self) -> Requirement {
        Requirement::new(self.required_bandwidth, self.tier())
    }

    /// Boundary checks in wire order: operators, then bandwidth, then the
    /// enumeration cap.
    pub fn validate(&self, max_operators: usize) -> Result<(), ControlRecord> {
        if self.operators.is_empty() {
            return Err(ControlRecord::new(
                ResponseCode::NoOperators,
                "No operators provided as input. At least one operator is required.",
            ));
        }
        if self.required_bandwidth <= 0.0 {
            return Err(ControlRecord::new(
                ResponseCode::NonPositiveBandwidth,
                "Required bandwidth must be greater than zero.",
            ));
        }
        if self.operators.len() > max_operators {
            return Err(ControlRecord::new(
                ResponseCode::TooManyOperators,
                format!(
                    "Too many operators provided as input. At most {max_operators} are supported, got {}.",
                    self.operators.len()
                ),
            ));
        }
        Ok(())
    }
}

fn integral_level(level: &serde_json::Number) -> Option<i64> {
    if let Some(level) = level.as_i64() {
        return Some(level);
    }
    let level = level.as_f64()?;
    if level.fract() != 0.0 || level < i64::MIN as f64 || level > i64::MAX as f64 {
        return None;
    }
    Some(level as i64)
}

pub fn parse_request(line: &str) -> Result<CombinationRequest, serde_json::Error> {
    serde_json::from_str(line)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum ResponseEntry {
    Combination(Vec<Operator>),
    Control(ControlRecord),
}

/// A success carries every combination followed by a trailing control
/// record; a failure is the bare control record.
#[derive(Debug, Clone, PartialEq)]
pub enum CombinationResponse {
    Combinations(Vec<Vec<Operator>>),
    Failure(ControlRecord),
}

impl CombinationResponse {
    pub fn from_result(operators: &[Operator], result: &CombinationSet) -> Self {
        CombinationResponse::Combinations(result.materialize(operators))
    }

    pub fn from_engine_error(err: &EngineError) -> Self {
        match err.kind {
            EngineErrorKind::TooManyOperators => CombinationResponse::Failure(ControlRecord::new(
                ResponseCode::TooManyOperators,
                err.to_string(),
            )),
            EngineErrorKind::InvalidBandwidth => {
                CombinationResponse::Failure(ControlRecord::computation_failed(err))
            }
        }
    }

    pub fn code(&self) -> ResponseCode {
        match self {
            CombinationResponse::Combinations(_) => ResponseCode::Success,
            CombinationResponse::Failure(record) => record.code,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            CombinationResponse::Combinations(combinations) => {
                let mut entries: Vec<ResponseEntry> = combinations
                    .iter()
                    .cloned()
                    .map(ResponseEntry::Combination)
                    .collect();
                entries.push(ResponseEntry::Control(ControlRecord::success()));
                serde_json::to_value(entries)
            }
            CombinationResponse::Failure(record) => serde_json::to_value(record),
        }
    }
}

pub fn encode_response(response: &CombinationResponse) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_string(&response.to_json()?)?;
    Ok(format!("{encoded}\n"))
}
