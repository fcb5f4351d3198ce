//! Module configuration: wire records and validation of configuration
//! descriptions.

pub mod records;
pub mod validate;

pub use records::{
    BaudRate, ConfigHeader, ConfigRecord, ConfigType, ModuleConfig, Mpr121Config, OutputConfig,
    OutputConfigKind, PixelsConfig, ProgramConfig, RgbConfig, Rs485Config, ValueConfig,
    XbeeConfig, CONFIG_MAGIC, CONFIG_START, MPR121_CHANNELS, PROGRAM_CONFIG_VALUES,
};
pub use validate::{
    combine_mpr121_thresholds, ConfigValidationError, HeaderInput, ModuleConfigInput,
    OutputInput, MPR121_THRESHOLD_MAX,
};
