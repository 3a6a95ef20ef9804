//! Master password strength policy.

use crate::errors::{OtpVaultError, Result};

/// Thresholds a master password must meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    /// Out of lowercase, uppercase, digit and symbol.
    pub min_character_classes: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            min_character_classes: 3,
        }
    }
}

/// Result of assessing a password against a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0..=5: one point for meeting the length and one per character class.
    pub score: u8,
    pub is_strong: bool,
    /// Human-readable list of failed checks; empty when strong.
    pub issues: Vec<String>,
}

impl PasswordPolicy {
    pub fn assess(&self, password: &str) -> PasswordStrength {
        let mut issues = Vec::new();
        let mut score = 0u8;

        let length = password.chars().count();
        if length >= self.min_length {
            score += 1;
        } else {
            issues.push(format!("must be at least {} characters", self.min_length));
        }

        let classes = [
            password.chars().any(|c| c.is_lowercase()),
            password.chars().any(|c| c.is_uppercase()),
            password.chars().any(|c| c.is_ascii_digit()),
            password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        ];
        let present = classes.iter().filter(|&&p| p).count();
        score += present as u8;

        if present < self.min_character_classes {
            let names = ["lowercase letter", "uppercase letter", "digit", "symbol"];
            let missing: Vec<&str> = names
                .iter()
                .zip(classes)
                .filter(|(_, p)| !p)
                .map(|(n, _)| *n)
                .collect();
            issues.push(format!(
                "must mix at least {} character classes (missing: {})",
                self.min_character_classes,
                missing.join(", ")
            ));
        }

        PasswordStrength {
            score,
            is_strong: issues.is_empty(),
            issues,
        }
    }

    /// `Ok(())` for a strong password, `WeakPassword` naming the failed
    /// checks otherwise.
    pub fn check(&self, password: &str) -> Result<()> {
        let strength = self.assess(password);
        if strength.is_strong {
            Ok(())
        } else {
            Err(OtpVaultError::WeakPassword(strength.issues.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_password_scores_low() {
        let result = PasswordPolicy::default().assess("weak");
        assert!(!result.is_strong);
        assert!(result.score < 3);
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn strong_password_passes() {
        let result = PasswordPolicy::default().assess("StrongP@ssw0rd123!");
        assert!(result.is_strong);
        assert_eq!(result.score, 5);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn long_single_class_password_is_weak() {
        let err = PasswordPolicy::default()
            .check("alllowercaseletters")
            .unwrap_err();
        match err {
            OtpVaultError::WeakPassword(msg) => assert!(msg.contains("uppercase letter")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn thresholds_are_configurable() {
        let lax = PasswordPolicy {
            min_length: 4,
            min_character_classes: 1,
        };
        assert!(lax.check("abcd").is_ok());
        assert!(PasswordPolicy::default().check("Str0ng!Pass").is_ok());
    }
}
