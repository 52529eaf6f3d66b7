use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use clap::{Arg, ArgAction, Args, CommandFactory as _, Parser};
use instance_upgrade_core::VerifierConfig;
use instance_upgrade_openstack::{Credentials, DEFAULT_CLOUD, clouds_yaml_paths};

use super::*;

#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Cli {
    /// Verify cluster health for a given time period
    #[arg(long)]
    pub(crate) verify: bool,

    /// How long the cluster has to stay healthy
    #[arg(long, default_value = "1m", value_parser = parse_duration)]
    pub(crate) duration: Duration,

    /// Rebuild this instance from the target image when it runs another one
    #[arg(long = "instanceUpgrade")]
    pub(crate) instance_upgrade: bool,

    /// Serve the latest image id of image families over HTTP
    #[arg(
        long = "serveImageChannel",
        action = ArgAction::Set,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub(crate) serve_image_channel: bool,

    /// Target image id, or "latest" for the newest image named by --image-name
    #[arg(long, env = "SYSTEM_UPGRADE_PLAN_LATEST_VERSION", default_value = "latest")]
    pub(crate) image_id: String,

    /// Image family to resolve "latest" against
    #[arg(long, env = "SYSTEM_UPGRADE_IMAGE_NAME")]
    pub(crate) image_name: Option<String>,

    /// Address the image channel listens on
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub(crate) listen: String,

    /// Time between two cluster health checks
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub(crate) check_interval: Duration,

    /// Give up verifying cluster health after this long
    #[arg(long, default_value = "1h", value_parser = parse_duration)]
    pub(crate) timeout: Duration,

    /// Instance metadata document
    #[arg(long, default_value = instance_upgrade::METADATA_URL)]
    pub(crate) metadata_url: String,

    #[command(flatten)]
    pub(crate) openstack: OpenStackArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Task {
    Verify,
    InstanceUpgrade,
    ServeImageChannel,
}

impl Cli {
    /// Parse the process arguments, Go style `-flag` spellings included
    ///
    pub(crate) fn parse_args() -> Self {
        Self::parse_from(go_style_flags(std::env::args_os()))
    }

    pub(crate) fn task(&self) -> Option<Task> {
        if self.verify {
            Some(Task::Verify)
        } else if self.instance_upgrade {
            Some(Task::InstanceUpgrade)
        } else if self.serve_image_channel {
            Some(Task::ServeImageChannel)
        } else {
            None
        }
    }

    pub(crate) fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            check_interval: self.check_interval,
            timeout: self.timeout,
        }
    }
}

/// OpenStack client settings. The `clouds.yaml` entry of `--os-cloud` wins
/// over the individual settings.
#[derive(Debug, Args)]
pub(crate) struct OpenStackArgs {
    #[arg(long, env = "OS_CLOUD", default_value = DEFAULT_CLOUD)]
    os_cloud: String,

    #[arg(long, env = "OS_CLIENT_CONFIG_FILE")]
    os_client_config_file: Option<PathBuf>,

    #[arg(long, env = "OS_AUTH_URL")]
    os_auth_url: Option<String>,

    #[arg(long, env = "OS_USERNAME")]
    os_username: Option<String>,

    #[arg(long, env = "OS_PASSWORD", hide_env_values = true)]
    os_password: Option<String>,

    #[arg(long, env = "OS_USER_DOMAIN_NAME")]
    os_user_domain_name: Option<String>,

    #[arg(long, env = "OS_PROJECT_ID")]
    os_project_id: Option<String>,

    #[arg(long, env = "OS_PROJECT_NAME")]
    os_project_name: Option<String>,

    #[arg(long, env = "OS_PROJECT_DOMAIN_NAME")]
    os_project_domain_name: Option<String>,

    #[arg(long, env = "OS_APPLICATION_CREDENTIAL_ID")]
    os_application_credential_id: Option<String>,

    #[arg(long, env = "OS_APPLICATION_CREDENTIAL_SECRET", hide_env_values = true)]
    os_application_credential_secret: Option<String>,

    #[arg(long, env = "OS_REGION_NAME")]
    os_region_name: Option<String>,

    #[arg(long, env = "OS_INTERFACE")]
    os_interface: Option<String>,
}

impl OpenStackArgs {
    pub(crate) fn credentials(&self) -> instance_upgrade_openstack::Result<Credentials> {
        let paths = clouds_yaml_paths(self.os_client_config_file.as_deref());
        let credentials = match Credentials::load_cloud(&paths, &self.os_cloud)? {
            Some(cloud) => cloud.or(self.environment()),
            None => self.environment(),
        };
        Ok(credentials)
    }

    fn environment(&self) -> Credentials {
        Credentials {
            auth_url: self.os_auth_url.clone(),
            username: self.os_username.clone(),
            password: self.os_password.clone(),
            user_domain_name: self.os_user_domain_name.clone(),
            project_id: self.os_project_id.clone(),
            project_name: self.os_project_name.clone(),
            project_domain_name: self.os_project_domain_name.clone(),
            application_credential_id: self.os_application_credential_id.clone(),
            application_credential_secret: self.os_application_credential_secret.clone(),
            region_name: self.os_region_name.clone(),
            interface: self.os_interface.clone(),
        }
    }
}

/// Rewrites `-flag` and `-flag=value` to `--flag` for every long flag
///
fn go_style_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let command = Cli::command();
    let longs = command
        .get_arguments()
        .filter_map(Arg::get_long)
        .collect::<Vec<_>>();

    let mut args = args.into_iter().map(Into::into);
    let mut rewritten = Vec::new();
    rewritten.extend(args.next());
    for arg in args.by_ref() {
        if arg == "--" {
            rewritten.push(arg);
            break;
        }
        let arg = single_dash_long(&arg, &longs).unwrap_or(arg);
        rewritten.push(arg);
    }
    rewritten.extend(args);
    rewritten
}

fn single_dash_long(arg: &OsStr, longs: &[&str]) -> Option<OsString> {
    let flag = arg.to_str()?.strip_prefix('-')?;
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    longs
        .contains(&name)
        .then(|| OsString::from(format!("--{flag}")))
}

/// Go style duration, e.g. "90s" or "1h30m"
fn parse_duration(text: &str) -> Result<Duration, String> {
    let nanos = go_parse_duration::parse_duration(text)
        .map_err(|err| format!("invalid duration {text:?}: {err:?}"))?;
    u64::try_from(nanos)
        .map(Duration::from_nanos)
        .map_err(|_| format!("negative duration {text:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv = ["instance-upgrade"].iter().chain(args).copied();
        Cli::try_parse_from(go_style_flags(argv)).unwrap()
    }

    #[test]
    fn serves_image_channel_by_default() {
        let cli = parse(&[]);
        assert_eq!(cli.task(), Some(Task::ServeImageChannel));
        assert_eq!(cli.duration, Duration::from_secs(60));
        assert_eq!(cli.listen, "0.0.0.0:8080");
        assert_eq!(cli.verifier_config(), VerifierConfig::default());
    }

    #[test]
    fn verify_takes_precedence() {
        let cli = parse(&["--verify", "--instanceUpgrade", "--duration", "1h30m"]);
        assert_eq!(cli.task(), Some(Task::Verify));
        assert_eq!(cli.duration, Duration::from_secs(90 * 60));
    }

    #[test]
    fn instance_upgrade() {
        let cli = parse(&["--instanceUpgrade", "--image-id", "img-1"]);
        assert_eq!(cli.task(), Some(Task::InstanceUpgrade));
        assert_eq!(cli.image_id, "img-1");
    }

    #[test]
    fn no_task() {
        let cli = parse(&["--serveImageChannel=false"]);
        assert_eq!(cli.task(), None);
        let cli = parse(&["--serveImageChannel", "false"]);
        assert_eq!(cli.task(), None);
    }

    #[test]
    fn single_dash_flags() {
        let cli = parse(&["-verify", "-duration", "5m"]);
        assert_eq!(cli.task(), Some(Task::Verify));
        assert_eq!(cli.duration, Duration::from_secs(5 * 60));

        let cli = parse(&["-instanceUpgrade", "-image-id=img-1"]);
        assert_eq!(cli.task(), Some(Task::InstanceUpgrade));
        assert_eq!(cli.image_id, "img-1");

        let cli = parse(&["-serveImageChannel=false"]);
        assert_eq!(cli.task(), None);
    }

    #[test]
    fn single_dash_rewrite_is_limited_to_known_flags() {
        let args = go_style_flags([
            "instance-upgrade",
            "-verify",
            "--duration",
            "-1s",
            "--",
            "-verify",
        ]);
        assert_eq!(
            args,
            ["instance-upgrade", "--verify", "--duration", "-1s", "--", "-verify"]
        );

        let args = go_style_flags(["instance-upgrade", "-bogus"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn verifier_timing() {
        let cli = parse(&["--verify", "--check-interval", "2s", "--timeout", "15m"]);
        let config = cli.verifier_config();
        assert_eq!(config.check_interval, Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(15 * 60));
    }

    #[test]
    fn credentials_from_flags() {
        let cli = parse(&[
            "--os-cloud",
            "instance-upgrade-no-such-cloud",
            "--os-auth-url",
            "https://keystone.example.com:5000/v3",
            "--os-application-credential-id",
            "4a3f",
            "--os-application-credential-secret",
            "secret",
        ]);
        let credentials = cli.openstack.credentials().unwrap();
        assert_eq!(
            credentials.auth_url.as_deref(),
            Some("https://keystone.example.com:5000/v3")
        );
        assert_eq!(credentials.application_credential_id.as_deref(), Some("4a3f"));
    }

    #[test]
    fn credentials_from_clouds_yaml() {
        let dir = std::env::temp_dir().join(format!("upgrade-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("clouds.yaml");
        std::fs::write(
            &file,
            "clouds:\n  openstack:\n    auth:\n      auth_url: https://keystone.example.com/v3\n      username: upgrader\n      password: hunter2\n",
        )
        .unwrap();

        let cli = parse(&[
            "--os-client-config-file",
            file.to_str().unwrap(),
            "--os-auth-url",
            "https://ignored.example.com",
            "--os-region-name",
            "RegionTwo",
        ]);
        let credentials = cli.openstack.credentials().unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(
            credentials.auth_url.as_deref(),
            Some("https://keystone.example.com/v3")
        );
        assert_eq!(credentials.username.as_deref(), Some("upgrader"));
        assert_eq!(credentials.region_name.as_deref(), Some("RegionTwo"));
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("90s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(Cli::try_parse_from(["instance-upgrade", "--duration", "soon"]).is_err());
    }
}
