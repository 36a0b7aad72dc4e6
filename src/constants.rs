/// Speed of light in m.s⁻¹
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Earth angular velocity, in WGS84 frame rad/s
pub const EARTH_ANGULAR_VEL_RAD: f64 = 7.2921151467E-5;

/// Earth gravitational constant (m^3 s-2), as broadcast in GPS navigation messages
pub const EARTH_GRAVITATION_MU_M3_S2: f64 = 3.986005E14;

/// Relativistic clock correction constant F = -2 sqrt(mu) / c² (s.m^-1/2)
pub const RELATIVISTIC_F: f64 = -4.442807633E-10;

/// GPS semicircle to radians
pub const SEMICIRCLE_RAD: f64 = std::f64::consts::PI;

/// Seconds in one GPS week
pub const WEEK_SECONDS: f64 = 604_800.0;

/// GPS broadcast week number roll-over period (10 bits)
pub const WEEK_ROLLOVER: u32 = 1024;

/// L1 / E1 / B1C carrier frequency (Hz)
pub const L1_FREQUENCY_HZ: f64 = 1575.42E6;

/// GLONASS G1 FDMA base frequency (Hz)
pub const G1_FREQUENCY_HZ: f64 = 1602.0E6;

/// GLONASS G1 FDMA channel spacing (Hz)
pub const G1_CHANNEL_SPACING_HZ: f64 = 562.5E3;
