mod catalog;
mod render;

use anyhow::Context;
use solver_milp::TwoPhaseSolver;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ttable_core::Solver;
use types::SolveParams;

fn env_override<T: std::str::FromStr>(params_field: &mut T, var: &str) -> anyhow::Result<()>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Ok(v) = std::env::var(var) {
        *params_field = v.parse().with_context(|| format!("invalid {var}"))?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rooms_path: PathBuf = std::env::var("TTABLE__ROOMS")
        .unwrap_or_else(|_| "assets/rooms.json".into())
        .into();
    let subjects_path: PathBuf = std::env::var("TTABLE__SUBJECTS")
        .unwrap_or_else(|_| "assets/subjects.json".into())
        .into();

    let mut params = SolveParams::default();
    env_override(&mut params.time_limit_secs, "TTABLE__TIME_LIMIT_SECS")?;
    env_override(&mut params.threads, "TTABLE__THREADS")?;
    env_override(&mut params.seed, "TTABLE__SEED")?;

    let catalog = catalog::load(&rooms_path, &subjects_path)?;
    tracing::info!(
        classes = catalog.classes.len(),
        courses = catalog.course_count(),
        rooms = catalog.rooms.len(),
        "catalog loaded"
    );
    ttable_core::validate(&catalog, &params)?;

    render::diagnostics(&ttable_core::diagnostics(&catalog, &params));

    let result = TwoPhaseSolver::new().solve(&catalog, &params)?;
    render::report(&catalog, &params, &result);

    Ok(())
}
