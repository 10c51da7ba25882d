pub mod commands;
pub mod queries;

pub use commands::{
    AddDeviceHandler, AddTechNestHandler, CreateHolderHandler, UpdateDeviceIndicatorsHandler,
    UpdateTechNestIndicatorsHandler,
};
pub use queries::{
    GetDevicesHandler, GetDevicesIndicatorsHandler, GetHolderHandler,
    GetTechNestIndicatorsHandler, GetTechNestsHandler,
};
