mod analysis_input;
mod analysis_result;
mod result_record;

pub use analysis_input::{AnalysisInput, InputError, UnitEconomics};
pub use analysis_result::{AnalysisResult, BreakEven};
pub use result_record::{NewResultRecord, ResultRecord};
