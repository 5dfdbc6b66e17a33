// demos/simulated_autotune.rs

use free_flight_autotune::axis::{Axis, AxisOrder, PerAxis};
use free_flight_autotune::controller::AttitudeController;
use free_flight_autotune::error::StoreError;
use free_flight_autotune::gains::AxisGains;
use free_flight_autotune::maneuver::{wrap_180_cd, AttitudeSample};
use free_flight_autotune::persist::{ParamKey, ParamStore};
use free_flight_autotune::policy::FamilyPolicy;
use free_flight_autotune::report::{Announcement, TuneRecord, TuneReporter};
use free_flight_autotune::tuner::{AutoTuner, SessionStatus, TickInput, VehicleState};

/// Prints announcements and test records as they arrive.
struct Console {
    time: f32,
}

impl TuneReporter<f32> for Console {
    fn announce(&mut self, announcement: &Announcement<f32>) {
        println!("[{:8.3}] {:?}: {}", self.time, announcement.severity, announcement);
    }

    fn log_test(&mut self, record: &TuneRecord<f32>) {
        println!(
            "[{:8.3}]     axis {} phase {}: target {:-8.2} min {:-8.2} max {:-8.2} -> P {:.4} D {:.5} Angle P {:.3}",
            self.time,
            record.axis_id,
            record.phase_id,
            record.target,
            record.measured_min,
            record.measured_max,
            record.new_rate_p,
            record.new_rate_d,
            record.new_stab_p
        );
    }
}

/// Prints parameter writes.
struct Eeprom;

impl ParamStore<f32> for Eeprom {
    fn set(&mut self, key: ParamKey, value: f32) -> Result<(), StoreError> {
        println!("    {:<16} = {:.5}", key.name(), value);
        Ok(())
    }
}

fn main() {
    let policy = FamilyPolicy::<f32>::multirotor();
    let mut tuner = AutoTuner::new(&policy).expect("multirotor policy is valid");
    let mut controller = AttitudeController::new();
    let mut console = Console { time: 0.0 };

    // Simulated airframe: first order motors driving a damped rigid body.
    let authority = 400.0;
    let drag = 2.0;
    let motor_lag = 0.04;
    let mut motor = PerAxis::splat(0.0f32);
    let mut sample = AttitudeSample::<f32>::level();
    let dt = 0.0025;

    let gains = AxisGains {
        rate_p: 0.135,
        rate_i: 0.09,
        rate_d: 0.001,
        stab_p: 4.5,
        accel_max: 110_000.0,
    };
    let initial = PerAxis::new(gains, gains, AxisGains { rate_d: 0.0, ..gains });

    // Roll and pitch, as selected by an axis bitmask.
    let axes = AxisOrder::from_bitmask(0b011).expect("roll and pitch");
    if let Err(err) = tuner.begin(axes, initial, VehicleState::ready(), &mut console) {
        println!("autotune refused: {}", err);
        return;
    }

    while console.time < 3600.0 {
        let input = TickInput {
            sample,
            dt,
            pilot_override: false,
        };
        let output = tuner.tick(&input, &mut console);
        if output.status != SessionStatus::Running {
            break;
        }
        let drive = PerAxis::from(controller.control(tuner.gains(), output.command, &sample, dt, false));
        for axis in Axis::ALL {
            motor[axis] += (drive[axis] - motor[axis]) * dt / motor_lag;
            sample.rate[axis] += (authority * motor[axis] - drag * sample.rate[axis]) * dt;
            sample.angle[axis] += sample.rate[axis] * 100.0 * dt;
        }
        sample.angle.yaw = wrap_180_cd(sample.angle.yaw);
        console.time += dt;
    }

    println!();
    println!("Session {} after {:.1} s", tuner.status(), console.time);
    for axis in Axis::ALL {
        println!("    {:<5} {}", axis, tuner.gains()[axis]);
    }
    if tuner.status() == SessionStatus::Succeeded {
        println!("Saving:");
        if let Err(err) = tuner.save(&mut Eeprom) {
            println!("save failed: {}", err);
        }
    } else if let Some(reason) = tuner.abort_reason() {
        println!("Aborted: {}", reason);
    }
}
