//! FreshRSS's own CLI scripts, run as `php <app-dir>/cli/<script>.php`.

use std::path::PathBuf;

use freshrss_reactor::{CollaboratorError, InstallOptions, Installer};

use super::run_command;

pub const DEFAULT_OWNER: &str = "www-data";

pub struct ScriptInstaller {
    app_dir: PathBuf,
    php: String,
    owner: String,
}

impl ScriptInstaller {
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
            php: "php".to_string(),
            owner: DEFAULT_OWNER.to_string(),
        }
    }

    fn script_path(&self, script: &str) -> String {
        self.app_dir
            .join("cli")
            .join(format!("{script}.php"))
            .display()
            .to_string()
    }

    fn run_script(&self, script: &str, args: &[String]) -> Result<(), CollaboratorError> {
        let mut argv = vec![self.script_path(script)];
        argv.extend_from_slice(args);
        tracing::info!(script, "running FreshRSS script");
        run_command(&self.php, &argv)
    }
}

impl Installer for ScriptInstaller {
    fn apply_permissions(&mut self) -> Result<(), CollaboratorError> {
        let app = self.app_dir.display().to_string();
        let data = self.app_dir.join("data").display().to_string();
        let owner = format!("{0}:{0}", self.owner);
        run_command("chown", &["-R", owner.as_str(), app.as_str()])?;
        run_command("chmod", &["-R", "g+rw", data.as_str()])
    }

    fn prepare(&mut self) -> Result<(), CollaboratorError> {
        self.run_script("prepare", &[])
    }

    fn install(&mut self, options: &InstallOptions) -> Result<(), CollaboratorError> {
        self.run_script("do-install", &options.to_args())
    }

    fn create_user(&mut self, username: &str, password: &str) -> Result<(), CollaboratorError> {
        self.run_script(
            "create-user",
            &[
                "--user".to_string(),
                username.to_string(),
                "--password".to_string(),
                password.to_string(),
            ],
        )
    }
}
