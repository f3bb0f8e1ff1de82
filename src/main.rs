use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use job_assistant::cli::commands::{
    EmailApplication, PortalRun, build_backend, cmd_apply_email, cmd_apply_portal,
    cmd_draft_letter, cmd_update_cv, prompt_line, read_job_description,
};
use job_assistant::cli::config::{
    API_KEY_ENV, Cli, Commands, load_config, load_secrets, resolve_llm_settings,
};
use job_assistant::portal::submit_policy::SubmitMode;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let secrets = load_secrets(config.data_folder());

    // Resolve model settings: CLI > config > secrets/env > defaults
    let settings = resolve_llm_settings(&cli, &config, &secrets, std::env::var(API_KEY_ENV).ok());
    let backend = build_backend(&settings)?;

    match cli.command {
        Commands::UpdateCv { cv_path } => {
            cmd_update_cv(&cv_path, &config, backend)?;
        }
        Commands::DraftLetter {
            job_description,
            job_file,
        } => {
            let job_description =
                match read_job_description(job_description.as_deref(), job_file.as_deref())? {
                    Some(text) => text,
                    None => prompt_line("Please paste the job description")?,
                };
            cmd_draft_letter(&job_description, &config, backend)?;
        }
        Commands::ApplyEmail {
            job_description,
            job_file,
            recruiter_email,
            gmail_user,
            gmail_password,
            cv_path,
        } => {
            let job_description =
                match read_job_description(job_description.as_deref(), job_file.as_deref())? {
                    Some(text) => text,
                    None => prompt_line("Please paste the job description")?,
                };
            let recruiter_email = match recruiter_email {
                Some(email) => email,
                None => prompt_line("Please enter the recruiter's email")?,
            };
            let gmail_user = match gmail_user {
                Some(user) => user,
                None => prompt_line("Please enter your Gmail address")?,
            };
            let gmail_password = match gmail_password {
                Some(password) => password,
                None => rpassword::prompt_password("Please enter your Gmail App Password: ")?,
            };

            if [&job_description, &recruiter_email, &gmail_user, &gmail_password]
                .iter()
                .any(|v| v.trim().is_empty())
            {
                return Err("Missing required information.".into());
            }

            let application = EmailApplication {
                job_description,
                recruiter_email,
                gmail_user,
                gmail_password,
                cv_path,
            };
            cmd_apply_email(&application, &config, backend)?;
        }
        Commands::ApplyPortal {
            url,
            max_pages,
            auto_submit,
            dry_run,
            no_keep_open,
            headless,
        } => {
            let url = match url {
                Some(url) => url,
                None => prompt_line("Please enter the job portal URL")?,
            };
            let submit = if auto_submit {
                SubmitMode::Auto
            } else if dry_run {
                SubmitMode::DryRun
            } else {
                config.apply.submit
            };

            let run = PortalRun {
                url,
                max_pages,
                submit,
                keep_open: !no_keep_open,
                headless,
            };
            cmd_apply_portal(&run, &config, backend)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("warn,{}={}", env!("CARGO_CRATE_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
