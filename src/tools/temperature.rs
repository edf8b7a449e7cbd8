//! `convert_temperature` tool
//!
//! Every conversion goes through Celsius, so each of the six unit pairs is
//! the composition of two affine maps.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

use super::{parse_args, round2, InputError, ToolContext, ToolExecutor};
use crate::error::Result;
use crate::mcp::types::{CallToolResponse, McpTool};

/// Tool name on the wire
pub const NAME: &str = "convert_temperature";

const KELVIN_OFFSET: f64 = 273.15;

/// Supported temperature scales
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    /// Degrees Celsius
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
    /// Kelvin
    Kelvin,
}

impl TemperatureUnit {
    /// One-letter symbol used in tool output
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
            TemperatureUnit::Kelvin => "K",
        }
    }

    fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            TemperatureUnit::Kelvin => value - KELVIN_OFFSET,
        }
    }

    fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            TemperatureUnit::Kelvin => celsius + KELVIN_OFFSET,
        }
    }

    /// Convert `value` from this unit into `target`
    pub fn convert(self, value: f64, target: TemperatureUnit) -> f64 {
        if self == target {
            return value;
        }
        target.from_celsius(self.to_celsius(value))
    }
}

impl FromStr for TemperatureUnit {
    type Err = InputError;

    /// Accepts `C`/`F`/`K` or the full scale name, any case.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "C" | "CELSIUS" => Ok(TemperatureUnit::Celsius),
            "F" | "FAHRENHEIT" => Ok(TemperatureUnit::Fahrenheit),
            "K" | "KELVIN" => Ok(TemperatureUnit::Kelvin),
            _ => Err(InputError::UnknownUnit(s.to_string())),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Convert a temperature between unit names, unrounded
///
/// # Errors
///
/// Returns [`InputError::UnknownUnit`] if either unit is not recognised
///
/// # Examples
///
/// ```
/// use mcpdemo::tools::temperature::convert_temperature;
///
/// assert_eq!(convert_temperature(0.0, "Celsius", "Fahrenheit").unwrap(), 32.0);
/// assert_eq!(convert_temperature(273.15, "Kelvin", "Celsius").unwrap(), 0.0);
/// ```
pub fn convert_temperature(
    value: f64,
    from_unit: &str,
    to_unit: &str,
) -> std::result::Result<f64, InputError> {
    let from: TemperatureUnit = from_unit.parse()?;
    let to: TemperatureUnit = to_unit.parse()?;
    Ok(from.convert(value, to))
}

#[derive(Debug, Deserialize)]
struct ConvertArgs {
    value: f64,
    from_unit: String,
    to_unit: String,
}

/// Executor for [`NAME`]
pub struct ConvertTemperatureTool;

#[async_trait]
impl ToolExecutor for ConvertTemperatureTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: NAME.to_string(),
            description: Some(
                "Convert temperature between Celsius (C), Fahrenheit (F), and Kelvin (K)"
                    .to_string(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "value": {"type": "number", "description": "Temperature to convert"},
                    "from_unit": {"type": "string", "description": "Source unit: C, F, or K"},
                    "to_unit": {"type": "string", "description": "Target unit: C, F, or K"}
                },
                "required": ["value", "from_unit", "to_unit"]
            }),
        }
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<CallToolResponse> {
        let args: ConvertArgs = parse_args(NAME, args)?;

        let units = args
            .from_unit
            .parse::<TemperatureUnit>()
            .and_then(|from| {
                args.to_unit
                    .parse::<TemperatureUnit>()
                    .map(|to| (from, to))
            });

        match units {
            Ok((from, to)) => Ok(CallToolResponse::json(serde_json::json!({
                "original_value": args.value,
                "original_unit": from.symbol(),
                "converted_value": round2(from.convert(args.value, to)),
                "converted_unit": to.symbol(),
            }))),
            Err(e) => Ok(CallToolResponse::error(e.to_string())),
        }
    }
}
