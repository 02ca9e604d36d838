use std::env;

use anyhow::{Result, bail};

use super::super::{args::ExtractArgs, exit_status::ExitStatus, report};
use crate::{
    config::{CONFIG_FILE_NAME, Config, load_config},
    core::{
        TranslationMap,
        cache::{Cache, FileCache, NullCache},
    },
    task::ExtractTask,
};

pub fn extract(args: ExtractArgs) -> Result<ExitStatus> {
    let verbose = args.verbose;
    let loaded = load_config(&env::current_dir()?)?;
    if verbose {
        report::print_config_source_to(loaded.path.as_deref(), &mut std::io::stderr().lock());
    }

    let config = apply_args(loaded.config, args);
    config.validate()?;
    if verbose {
        report::print_settings_to(config.format, &config.parsers, &mut std::io::stderr().lock());
    }
    if config.output.is_empty() {
        bail!(
            "No output specified. Use --output or set 'output' in {}",
            CONFIG_FILE_NAME
        );
    }

    let cache: Box<dyn Cache<Vec<TranslationMap>>> = match &config.cache_file {
        Some(path) => Box::new(FileCache::<Vec<TranslationMap>>::open(path)?),
        None => Box::new(NullCache),
    };

    let task = ExtractTask::new(config.input.clone(), config.output.clone())
        .patterns(config.patterns.clone())
        .replace(config.replace)
        .parsers(config.parsers.clone())
        .custom_marker(config.marker.clone())
        .post_processors(config.post_processors())
        .compiler(config.compiler())
        .cache(cache)
        .timeout(config.worker_timeout());

    let outcome = task.execute(report::print_progress)?;
    report::print_outcome(&outcome, verbose);

    Ok(if outcome.has_failed_destinations() {
        ExitStatus::Failure
    } else {
        ExitStatus::Success
    })
}

/// Overlay command-line options on the loaded configuration.
fn apply_args(mut config: Config, args: ExtractArgs) -> Config {
    if !args.input.is_empty() {
        config.input = args.input;
    }
    if !args.output.is_empty() {
        config.output = args.output;
    }
    if !args.patterns.is_empty() {
        config.patterns = args.patterns;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(indentation) = args.format_indentation {
        config.format_indentation = indentation;
    }
    config.replace |= args.replace;
    config.sort |= args.sort;
    if let Some(sensitivity) = args.sort_sensitivity {
        config.sort_sensitivity = sensitivity;
    }
    config.clean |= args.clean;

    // A default-value option given on the command line replaces the configured one.
    if args.key_as_default_value
        || args.key_as_initial_default_value
        || args.string_as_default_value.is_some()
    {
        config.key_as_default_value = args.key_as_default_value;
        config.key_as_initial_default_value = args.key_as_initial_default_value;
        config.string_as_default_value = args.string_as_default_value;
    }

    if args.strip_prefix.is_some() {
        config.strip_prefix = args.strip_prefix;
    }
    if args.marker.is_some() {
        config.marker = args.marker;
    }
    if !args.parsers.is_empty() {
        config.parsers = args.parsers;
    }
    if args.cache_file.is_some() {
        config.cache_file = args.cache_file;
    }
    if args.no_po_source_locations {
        config.po_source_locations = false;
    }
    if let Some(domain) = args.po_domain {
        config.po_domain = domain;
    }
    config
}
