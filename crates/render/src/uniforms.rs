//! Uniform names shared by the passes and every backend.

pub const MODEL: &str = "model";
pub const VIEW: &str = "view";
pub const PROJECTION: &str = "projection";
pub const NORMAL_MATRIX: &str = "normalMatrix";
pub const LIGHT_SPACE: &str = "lightSpaceTrMatrix";
pub const LIGHT_DIR: &str = "lightDir";
pub const LIGHT_DIR_MATRIX: &str = "lightDirMatrix";
pub const LIGHT_COLOR: &str = "lightColor";
pub const FOG_DENSITY: &str = "fogDensity";
pub const POINT_LIGHT_ENABLED: &str = "pointinit";
pub const POINT_LIGHT_POSITION: &str = "lightPos1";
pub const SHADOW_MAP: &str = "shadowMap";
