//! Zone automation configuration engine.
//!
//! Turns a cultivation recipe plus the operator's climate, water and
//! lighting forms into recommended forms, a validation report and the
//! growth-cycle configuration payload sent to the control backend. Nothing
//! here performs I/O or keeps state between calls.
//!
//! Typical submission flow:
//!
//! ```
//! use zone_automation::{build_growth_cycle_config_payload, reset_to_recommended, validate_forms, Recipe};
//!
//! let recipe = Recipe::from_json(r#"{"climate":{"day_temp":{"min":22,"max":26}}}"#).unwrap();
//! let forms = reset_to_recommended(&recipe);
//! assert_eq!(forms.climate.day_temp, 24.0);
//!
//! let report = validate_forms(&forms);
//! assert!(report.valid);
//! let payload = build_growth_cycle_config_payload(&forms);
//! assert_eq!(payload.climate.day_temp, 24.0);
//! ```

pub mod clamp;
pub mod clock;
pub mod forms;
pub mod layout;
pub mod lenient;
pub mod payload;
pub mod ranges;
pub mod recipe;
pub mod validate;

pub use clamp::clamp;
pub use forms::{
    ClimateFormState, FormKind, LightingFormState, SystemType, WaterFormState, ZoneAutomationForms,
};
pub use layout::{sync_system_to_tank_layout, TankLayout};
pub use payload::{build_growth_cycle_config_payload, GrowthCycleConfigPayload};
pub use recipe::{apply_automation_from_recipe, reset_to_recommended, AppliedField, AppliedFields, Recipe, Target};
pub use validate::{validate_forms, FieldError, ValidationReport};
