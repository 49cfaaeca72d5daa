//! Fixed control constants.
//!
//! These values were tuned on the prototype chassis and are deliberately not
//! configuration: the control behavior is specified against them.

/// Maximum wait for an ultrasonic echo, in microseconds (~5 m round trip).
pub const ECHO_TIMEOUT_US: u64 = 30_000;

/// Speed of sound, cm per microsecond. Echo time covers the round trip, so
/// distance = echo_us * SOUND_CM_PER_US / 2.
pub const SOUND_CM_PER_US: f64 = 0.034;

/// Distance reported when no echo arrives: out of range, path clear.
pub const OUT_OF_RANGE_CM: u16 = 400;

/// PWM duty (of 255) applied to both wheels for all drive commands.
pub const DRIVE_DUTY: u8 = 150;

/// Forward motion is refused below this range (cm).
pub const OBSTACLE_STOP_CM: u16 = 20;

/// Beyond this range (cm) the rover closes in on the flame.
pub const APPROACH_CM: u16 = 30;

/// Inside this range (cm) the rover backs off before spraying.
pub const RETREAT_CM: u16 = 15;

/// Re-aim nudges only apply while the target sits in this window (cm).
pub const REAIM_MIN_CM: u16 = 10;
pub const REAIM_MAX_CM: u16 = 100;

/// Scan servo travel limits and rest position (degrees).
pub const SCAN_MIN_DEG: i16 = 0;
pub const SCAN_MAX_DEG: i16 = 180;
pub const SCAN_CENTER_DEG: u8 = 90;

/// Sweep step per scan tick (degrees).
pub const SWEEP_STEP_DEG: i16 = 10;

/// Servo correction applied against the sweep direction when the target
/// drifts out of the beam (degrees).
pub const REAIM_NUDGE_DEG: i16 = 5;

/// Sweep cadence while scanning for flame (ms).
pub const SWEEP_PERIOD_MS: u64 = 50;

/// Indicator blink cycles and half-period when a flame is sighted (ms).
pub const ALERT_BLINKS: u8 = 5;
pub const ALERT_TOGGLE_MS: u64 = 200;

/// Mechanical settling time after aiming the nozzle (ms).
pub const AIM_SETTLE_MS: u64 = 500;

/// Engagement loop cadence while the flame is burning (ms).
pub const ENGAGE_CYCLE_MS: u64 = 100;

/// Duration of the fixed reverse leg when too close to the flame (ms).
pub const RETREAT_DRIVE_MS: u64 = 500;

/// Pause before the sweep resumes after a flame goes out (ms).
pub const COOLDOWN_MS: u64 = 1000;

/// Soil-moisture sampling window (ms).
pub const SOIL_PERIOD_MS: u64 = 5000;

/// Scheduler tick interval (ms).
pub const TICK_MS: u64 = 10;
