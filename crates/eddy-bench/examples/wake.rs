//! Turbulent wake behind a cylinder, driven through the lockstep runner.
//!
//! Demonstrates: build profile → LockstepRunner → step → read observables
//! → inspect the velocity field. Set `RUST_LOG=eddy=debug` for more.

use eddy_bench::{turbulent_channel, CHANNEL_INLET};
use eddy_engine::{InstabilityPolicy, LockstepRunner, RunConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eddy_engine=info".parse()?),
        )
        .init();

    println!("=== eddy turbulent wake ===\n");

    let coupled = turbulent_channel()?;
    let config = RunConfig::default().policy(InstabilityPolicy::Halt);
    let mut runner = LockstepRunner::new(Box::new(coupled), config)?;

    for step in 0..2000 {
        let result = runner.step_sync()?;
        if let Some(hit) = result.instability {
            tracing::error!(%hit, "run halted");
            break;
        }
        if step % 250 == 0 || step == 1999 {
            let obs = &result.metrics.observables;
            println!(
                "  step {:>4}: mass={:>10.3} KE={:>9.5} max|u|={:>6.4} mean νT={:>9.2e} time={:>6}μs",
                result.step(),
                obs.get("total_mass").unwrap_or(f64::NAN),
                obs.get("kinetic_energy").unwrap_or(f64::NAN),
                obs.get("max_speed").unwrap_or(f64::NAN),
                obs.get("mean_turbulent_viscosity").unwrap_or(f64::NAN),
                result.metrics.total_us,
            );
        }
    }

    let max_speed = runner
        .last_metrics()
        .observables
        .get("max_speed")
        .unwrap_or(0.0);
    println!(
        "\nPeak speed {:.4} is {:.2}x the inlet speed",
        max_speed,
        max_speed / CHANNEL_INLET
    );
    Ok(())
}
