// tests/autotune_flight.rs

//! Flies whole autotune sessions against a simulated airframe with the
//! reference controller in the loop.

use free_flight_autotune::axis::{Axis, AxisOrder, PerAxis};
use free_flight_autotune::controller::AttitudeController;
use free_flight_autotune::error::StoreError;
use free_flight_autotune::gains::{AxisGains, GainKind, GainSet};
use free_flight_autotune::maneuver::{wrap_180_cd, AttitudeSample};
use free_flight_autotune::persist::{ParamKey, ParamStore};
use free_flight_autotune::policy::FamilyPolicy;
use free_flight_autotune::report::{Announcement, TuneRecord, TuneReporter};
use free_flight_autotune::tuner::{AutoTuner, SessionStatus, TickInput, VehicleState};

const DT: f32 = 0.0025;
const MAX_TICKS: usize = 1_000_000;

/// Rate response per unit of controller output, deg/s/s.
const CONTROL_AUTHORITY: f32 = 400.0;
/// Aerodynamic rate damping, 1/s.
const RATE_DRAG: f32 = 2.0;
/// Motor response time constant, s.
const MOTOR_LAG: f32 = 0.04;

/// Rigid body with first order motors on each axis.
#[derive(Default)]
struct Airframe {
    motor: PerAxis<f32>,
    rate: PerAxis<f32>,
    angle: PerAxis<f32>,
}

impl Airframe {
    fn sample(&self) -> AttitudeSample<f32> {
        AttitudeSample {
            rate: self.rate,
            angle: self.angle,
        }
    }

    fn step(&mut self, output: (f32, f32, f32), dt: f32) {
        let output = PerAxis::from(output);
        for axis in Axis::ALL {
            self.motor[axis] += (output[axis] - self.motor[axis]) * dt / MOTOR_LAG;
            self.rate[axis] += (CONTROL_AUTHORITY * self.motor[axis] - RATE_DRAG * self.rate[axis]) * dt;
            self.angle[axis] += self.rate[axis] * 100.0 * dt;
        }
        self.angle.yaw = wrap_180_cd(self.angle.yaw);
    }
}

#[derive(Default)]
struct Log {
    announcements: Vec<String>,
    records: Vec<TuneRecord<f32>>,
}

impl TuneReporter<f32> for Log {
    fn announce(&mut self, announcement: &Announcement<f32>) {
        self.announcements.push(announcement.to_string());
    }

    fn log_test(&mut self, record: &TuneRecord<f32>) {
        self.records.push(*record);
    }
}

#[derive(Default)]
struct Params {
    values: Vec<(ParamKey, f32)>,
}

impl ParamStore<f32> for Params {
    fn set(&mut self, key: ParamKey, value: f32) -> Result<(), StoreError> {
        self.values.retain(|(stored, _)| *stored != key);
        self.values.push((key, value));
        Ok(())
    }
}

fn starting_gains() -> GainSet<f32> {
    let gains = AxisGains {
        rate_p: 0.135,
        rate_i: 0.09,
        rate_d: 0.001,
        stab_p: 4.5,
        accel_max: 110_000.0,
    };
    PerAxis::new(gains, gains, AxisGains { rate_d: 0.0, ..gains })
}

/// Flies a session to its end, checking the bound invariant on every tick.
fn fly_session(policy: &FamilyPolicy<f32>, axes: AxisOrder) -> (AutoTuner<'_, f32>, Log) {
    let mut tuner = AutoTuner::new(policy).expect("valid policy");
    let mut log = Log::default();
    let mut controller = AttitudeController::new();
    let mut airframe = Airframe::default();

    tuner
        .begin(axes, starting_gains(), VehicleState::ready(), &mut log)
        .expect("session starts");

    for _ in 0..MAX_TICKS {
        let input = TickInput {
            sample: airframe.sample(),
            dt: DT,
            pilot_override: false,
        };
        let output = tuner.tick(&input, &mut log);
        if output.status != SessionStatus::Running {
            break;
        }
        for axis in axes.iter() {
            for kind in GainKind::ALL {
                if let Some(bounds) = policy.bounds.get(axis, kind) {
                    let value = tuner.gains()[axis].get(kind);
                    assert!(
                        bounds.contains(value),
                        "{} {} = {} outside [{}, {}]",
                        axis,
                        kind,
                        value,
                        bounds.min,
                        bounds.max
                    );
                }
            }
        }
        let drive = controller.control(tuner.gains(), output.command, &input.sample, DT, false);
        airframe.step(drive, DT);
    }
    (tuner, log)
}

fn check_outcome(policy: &FamilyPolicy<f32>, tuner: &AutoTuner<'_, f32>, log: &Log, axes: AxisOrder) {
    assert_eq!(
        tuner.status(),
        SessionStatus::Succeeded,
        "session ended with {:?}",
        tuner.abort_reason()
    );
    assert_eq!(tuner.abort_reason(), None);
    assert!(log.announcements.iter().all(|text| text.starts_with("AutoTune:")));
    assert!(!log.records.is_empty());

    let mut params = Params::default();
    tuner.save(&mut params).expect("save succeeds");
    for axis in Axis::ALL {
        if !axes.contains(axis) {
            assert!(!tuner.is_axis_tuned(axis), "{} was not selected", axis);
            assert!(params.values.iter().all(|(key, _)| key.axis != axis));
            continue;
        }
        assert!(tuner.is_axis_tuned(axis), "{} was not tuned", axis);
        assert_eq!(params.values.iter().filter(|(key, _)| key.axis == axis).count(), 5);
        let tuned = tuner.gains()[axis];
        for kind in GainKind::ALL {
            if let Some(bounds) = policy.bounds.get(axis, kind) {
                assert!(bounds.contains(tuned.get(kind)));
            }
        }
        assert!(tuned.accel_max >= policy.finalisation.accel_max_floor[axis]);
    }
}

#[test]
fn multirotor_session_tunes_every_axis() {
    let policy = FamilyPolicy::multirotor();
    let (tuner, log) = fly_session(&policy, AxisOrder::all());
    check_outcome(&policy, &tuner, &log, AxisOrder::all());
}

#[test]
fn helicopter_session_tunes_every_axis() {
    let policy = FamilyPolicy::helicopter();
    let (tuner, log) = fly_session(&policy, AxisOrder::all());
    check_outcome(&policy, &tuner, &log, AxisOrder::all());
}

#[test]
fn pitch_only_session_leaves_other_axes_alone() {
    let policy = FamilyPolicy::multirotor();
    let axes = AxisOrder::from_bitmask(2).expect("pitch");
    let (tuner, log) = fly_session(&policy, axes);
    check_outcome(&policy, &tuner, &log, axes);
    assert_eq!(tuner.gains().roll, starting_gains().roll);
    assert_eq!(tuner.gains().yaw, starting_gains().yaw);
    assert!(log.records.iter().all(|record| record.axis_id == Axis::Pitch.id()));
}
