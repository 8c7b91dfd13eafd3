use math_core::units::convert_unit;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{MathMcp, helpers};

/// Parameters for unit conversion.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ConvertUnitParams {
    pub value: f64,
    /// Source unit, e.g. `meter`, `kilogram`, `celsius`, `mile_per_hour`.
    pub from_unit: String,
    /// Target unit of the same dimension.
    pub to_unit: String,
}

#[tool_router(router = tool_router_units, vis = "pub")]
impl MathMcp {
    #[tool(description = "Convert a value between units of length, mass, time, temperature, volume, or speed. Example: 100 meter -> kilometer = 0.1.")]
    async fn convert_unit(
        &self,
        Parameters(params): Parameters<ConvertUnitParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(helpers::text_result(convert_unit(
            params.value,
            &params.from_unit,
            &params.to_unit,
        )))
    }
}
