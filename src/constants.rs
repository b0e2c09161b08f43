use std::{env, path::PathBuf};

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS shared credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// Environment variable overriding the shared credentials file location
pub const AWS_CREDENTIALS_FILE_ENV: &str = "AWS_SHARED_CREDENTIALS_FILE";

/// Preference file name, stored directly under the home directory
pub const PREFERENCES_FILE_NAME: &str = "aws-mfa-util.json";

/// Environment variable overriding the preference file location
pub const PREFERENCES_FILE_ENV: &str = "AWS_MFA_UTIL_CONFIG";

/// Session lifetime offered when no previous value is remembered
pub const DEFAULT_SESSION_TTL_SECONDS: u32 = 3600;

/// Region used to sign STS requests when none is given or remembered
pub const DEFAULT_STS_REGION: &str = "aws-global";

/// Suffix appended to the source profile when suggesting a destination name
pub const DESTINATION_PROFILE_SUFFIX: &str = "-mfa";

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_aws_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(AWS_CREDENTIALS_FILE_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| {
        home.join(AWS_CONFIG_DIR_NAME)
            .join(AWS_CREDENTIALS_FILE_NAME)
    })
}

/// Get the preference file path
/// Respects AWS_MFA_UTIL_CONFIG environment variable if set
pub fn get_preferences_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(PREFERENCES_FILE_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(PREFERENCES_FILE_NAME))
}

/// Suggested name for a new destination profile derived from `source`
pub fn default_destination_profile(source: &str) -> String {
    format!("{source}{DESTINATION_PROFILE_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_get_aws_credentials_path_with_env() {
        let original = env::var(AWS_CREDENTIALS_FILE_ENV).ok();

        unsafe {
            env::set_var(AWS_CREDENTIALS_FILE_ENV, "/custom/path/credentials");
        }
        let path = get_aws_credentials_path();
        assert_eq!(path, Some(PathBuf::from("/custom/path/credentials")));

        unsafe {
            match original {
                Some(val) => env::set_var(AWS_CREDENTIALS_FILE_ENV, val),
                None => env::remove_var(AWS_CREDENTIALS_FILE_ENV),
            }
        }
    }

    #[test]
    #[serial]
    fn test_get_aws_credentials_path_default() {
        let original = env::var(AWS_CREDENTIALS_FILE_ENV).ok();

        unsafe {
            env::remove_var(AWS_CREDENTIALS_FILE_ENV);
        }
        let path = get_aws_credentials_path();

        if let Some(p) = path {
            let path_str = p.to_string_lossy();
            assert!(path_str.contains(AWS_CONFIG_DIR_NAME));
            assert!(path_str.ends_with(AWS_CREDENTIALS_FILE_NAME));
        }

        unsafe {
            if let Some(val) = original {
                env::set_var(AWS_CREDENTIALS_FILE_ENV, val);
            }
        }
    }

    #[test]
    #[serial]
    fn test_get_preferences_path_with_env() {
        let original = env::var(PREFERENCES_FILE_ENV).ok();

        unsafe {
            env::set_var(PREFERENCES_FILE_ENV, "/custom/prefs.json");
        }
        assert_eq!(
            get_preferences_path(),
            Some(PathBuf::from("/custom/prefs.json"))
        );

        unsafe {
            match original {
                Some(val) => env::set_var(PREFERENCES_FILE_ENV, val),
                None => env::remove_var(PREFERENCES_FILE_ENV),
            }
        }
    }

    #[test]
    #[serial]
    fn test_get_preferences_path_default() {
        let original = env::var(PREFERENCES_FILE_ENV).ok();

        unsafe {
            env::remove_var(PREFERENCES_FILE_ENV);
        }
        if let Some(p) = get_preferences_path() {
            assert!(p.ends_with(PREFERENCES_FILE_NAME));
        }

        unsafe {
            if let Some(val) = original {
                env::set_var(PREFERENCES_FILE_ENV, val);
            }
        }
    }

    #[test]
    fn test_default_destination_profile() {
        assert_eq!(default_destination_profile("alice"), "alice-mfa");
    }
}
