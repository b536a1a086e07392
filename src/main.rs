use anyhow::Context;
use virtual_forest::ForestConfig;

/// Environment variable holding a fixed placement seed.
const SEED_VAR: &str = "FOREST_SEED";

fn config_from_env() -> anyhow::Result<ForestConfig> {
    match std::env::var(SEED_VAR) {
        Ok(seed) => {
            let seed = seed
                .trim()
                .parse()
                .with_context(|| format!("{SEED_VAR} must be an unsigned integer, got {seed:?}"))?;
            Ok(ForestConfig::seeded(seed))
        }
        Err(_) => Ok(ForestConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    virtual_forest::run(config_from_env()?)
}
