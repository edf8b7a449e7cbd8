//! `calculate_bmi` tool
//!
//! Body mass index is weight in kilograms divided by the square of height in
//! metres. The tool reports the index rounded to two decimals together with
//! its standard category.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{parse_args, round2, InputError, ToolContext, ToolExecutor};
use crate::error::Result;
use crate::mcp::types::{CallToolResponse, McpTool};

/// Tool name on the wire
pub const NAME: &str = "calculate_bmi";

/// Standard adult BMI bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BmiCategory {
    /// Below 18.5
    #[serde(rename = "Underweight")]
    Underweight,
    /// 18.5 up to 25
    #[serde(rename = "Normal weight")]
    Normal,
    /// 25 up to 30
    #[serde(rename = "Overweight")]
    Overweight,
    /// 30 and above
    #[serde(rename = "Obese")]
    Obese,
}

impl BmiCategory {
    /// Band containing `bmi`
    pub fn for_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        };
        write!(f, "{label}")
    }
}

/// Unrounded BMI and its category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmiReading {
    /// weight / height^2
    pub bmi: f64,
    /// Band for `bmi`
    pub category: BmiCategory,
}

/// Compute BMI from weight in kilograms and height in metres
///
/// # Errors
///
/// Returns [`InputError::NonPositiveMeasurement`] unless both inputs are
/// strictly positive
///
/// # Examples
///
/// ```
/// use mcpdemo::tools::bmi::{calculate_bmi, BmiCategory};
///
/// let reading = calculate_bmi(70.0, 1.75).unwrap();
/// assert!((reading.bmi - 22.857).abs() < 0.001);
/// assert_eq!(reading.category, BmiCategory::Normal);
/// ```
pub fn calculate_bmi(weight_kg: f64, height_m: f64) -> std::result::Result<BmiReading, InputError> {
    if !(weight_kg > 0.0 && height_m > 0.0) {
        return Err(InputError::NonPositiveMeasurement);
    }
    let bmi = weight_kg / (height_m * height_m);
    Ok(BmiReading {
        bmi,
        category: BmiCategory::for_bmi(bmi),
    })
}

#[derive(Debug, Deserialize)]
struct BmiArgs {
    weight_kg: f64,
    height_m: f64,
}

/// Executor for [`NAME`]
pub struct CalculateBmiTool;

#[async_trait]
impl ToolExecutor for CalculateBmiTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: NAME.to_string(),
            description: Some(
                "Calculate Body Mass Index from weight in kilograms and height in meters"
                    .to_string(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "weight_kg": {"type": "number", "description": "Weight in kilograms"},
                    "height_m": {"type": "number", "description": "Height in meters"}
                },
                "required": ["weight_kg", "height_m"]
            }),
        }
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<CallToolResponse> {
        let args: BmiArgs = parse_args(NAME, args)?;
        match calculate_bmi(args.weight_kg, args.height_m) {
            Ok(reading) => Ok(CallToolResponse::json(serde_json::json!({
                "bmi": round2(reading.bmi),
                "category": reading.category,
            }))),
            Err(e) => Ok(CallToolResponse::error(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_value() {
        let reading = calculate_bmi(70.0, 1.75).unwrap();
        assert_eq!(round2(reading.bmi), 22.86);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(BmiCategory::for_bmi(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::for_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::for_bmi(24.99), BmiCategory::Normal);
        assert_eq!(BmiCategory::for_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::for_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(
            calculate_bmi(0.0, 1.8),
            Err(InputError::NonPositiveMeasurement)
        );
        assert_eq!(
            calculate_bmi(70.0, -1.0),
            Err(InputError::NonPositiveMeasurement)
        );
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_value(BmiCategory::Normal).unwrap();
        assert_eq!(json, "Normal weight");
        assert_eq!(BmiCategory::Obese.to_string(), "Obese");
    }

    #[tokio::test]
    async fn test_execute_success_payload() {
        let resp = CalculateBmiTool
            .execute(
                serde_json::json!({"weight_kg": 70, "height_m": 1.75}),
                &ToolContext::new("1"),
            )
            .await
            .unwrap();
        assert!(resp.is_error.is_none());
        let value = resp.structured_content.unwrap();
        assert_eq!(value["bmi"], 22.86);
        assert_eq!(value["category"], "Normal weight");
    }

    #[tokio::test]
    async fn test_execute_domain_error_is_tool_error() {
        let resp = CalculateBmiTool
            .execute(
                serde_json::json!({"weight_kg": -5, "height_m": 1.75}),
                &ToolContext::new("1"),
            )
            .await
            .unwrap();
        assert_eq!(resp.is_error, Some(true));
        assert_eq!(
            resp.joined_text(),
            "Weight and height must be positive values"
        );
    }

    #[tokio::test]
    async fn test_execute_missing_argument_is_invalid_params() {
        let result = CalculateBmiTool
            .execute(serde_json::json!({"weight_kg": 70}), &ToolContext::new("1"))
            .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("height_m"));
    }
}
