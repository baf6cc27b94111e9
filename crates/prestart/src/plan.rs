//! The fixed startup sequence.

use prestart_core::error::ConfigError;
use prestart_core::scripting::command_step::CommandStep;
use prestart_core::scripting::executor::CommandInput;
use prestart_core::step::BoxedStep;
use prestart_db::{DbReadyStep, MigrateStep};

use crate::config::PrestartConfig;
use crate::seed::SeedLoader;

/// Build the startup sequence: wait for the database, migrate, then run
/// every seed loader in catalogue order.
pub fn build(config: &PrestartConfig) -> Result<Vec<BoxedStep>, ConfigError> {
    let mut steps: Vec<BoxedStep> = Vec::with_capacity(2 + SeedLoader::ALL.len());
    steps.push(Box::new(DbReadyStep::new(&config.db)));
    steps.push(Box::new(MigrateStep::new(&config.db)));

    for loader in SeedLoader::ALL {
        steps.push(Box::new(seed_step(loader, config)?));
    }

    Ok(steps)
}

/// Command step for one seed loader.
pub fn seed_step(loader: SeedLoader, config: &PrestartConfig) -> Result<CommandStep, ConfigError> {
    let input = CommandInput {
        env_vars: vec![("SEED_LOADER".to_string(), loader.slug().to_string())],
        working_directory: config.seed_working_dir.clone(),
        timeout: config.step_timeout,
    };
    let line = loader.render_command(&config.seed_command_template);
    CommandStep::from_command_line(loader.step_name(), &line, input).map_err(|_| {
        ConfigError::Invalid {
            var: "SEED_COMMAND_TEMPLATE",
            value: config.seed_command_template.clone(),
            reason: format!("renders to an empty command for loader {loader}"),
        }
    })
}
