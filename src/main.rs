use anyhow::Result;
use fdtd1d::settings;
use fdtd1d::simulation::Simulation;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = settings::load_config()?;
    let mut simulation = Simulation::new(settings)?;

    simulation.run()?;
    let results = simulation.analyze()?;
    results.print();
    simulation.writeup(&results)?;

    Ok(())
}
