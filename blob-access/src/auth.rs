use serde_json::{Map, Value};
use crate::error::AccessError;
use crate::principals::PrincipalRegistry;

/// Identity signals populated by the transport layer. Clients cannot set these;
/// the fronting gateway overwrites or strips them.
#[derive(Debug, Clone, Default)]
pub struct IdentitySignals {
    /// ARN of an infrastructure-signed caller.
    pub signer_arn: Option<String>,
    /// Caller id of an infrastructure-signed caller, when no ARN is available.
    pub caller_id: Option<String>,
    /// Claims of a federated user session.
    pub claims: Option<Map<String, Value>>,
}

/// The account a request acts for, and how that was established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedCaller {
    pub account_id: String,
    /// Present when the caller is infrastructure-signed. Must pass the principal
    /// registry before the request proceeds.
    pub principal: Option<String>,
}

impl AuthenticatedCaller {
    pub fn is_direct_signed(&self) -> bool {
        self.principal.is_some()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl IdentitySignals {
    /// Resolves the authenticated account.
    ///
    /// Infrastructure-signed callers act for the account named in the path; session
    /// callers act for their `sub` claim. The signed path is checked first.
    pub fn resolve(&self, path_account_id: Option<&str>) -> Result<AuthenticatedCaller, AccessError> {
        if let Some(principal) = non_empty(&self.signer_arn).or_else(|| non_empty(&self.caller_id)) {
            let account_id = path_account_id.filter(|a| !a.is_empty()).ok_or_else(|| {
                AccessError::Unauthenticated("missing accountId path parameter for signed caller".to_string())
            })?;
            return Ok(AuthenticatedCaller {
                account_id: account_id.to_string(),
                principal: Some(principal.to_string()),
            });
        }

        if let Some(claims) = &self.claims {
            return match claims.get("sub").and_then(Value::as_str) {
                Some(sub) if !sub.is_empty() => Ok(AuthenticatedCaller {
                    account_id: sub.to_string(),
                    principal: None,
                }),
                _ => Err(AccessError::Unauthenticated("sub claim not found or empty".to_string())),
            };
        }

        Err(AccessError::Unauthenticated("no authentication context present".to_string()))
    }
}

/// Resolves the caller and checks that it may act for `account_id`: signed callers
/// must be registered principals, and every caller must resolve to `account_id`.
pub fn authorize_account(
    signals: &IdentitySignals,
    registry: &PrincipalRegistry,
    account_id: &str,
) -> Result<AuthenticatedCaller, AccessError> {
    let caller = signals.resolve(Some(account_id))?;

    if let Some(principal) = caller.principal.as_deref() {
        if !registry.is_allowed(principal) {
            tracing::warn!(principal, "Signed caller is not a registered plugin principal");
            return Err(AccessError::Forbidden("Principal not authorized".to_string()));
        }
    }

    if caller.account_id != account_id {
        return Err(AccessError::Forbidden("Account mismatch".to_string()));
    }
    Ok(caller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::error::ErrorKind;

    fn claims(value: Value) -> Option<Map<String, Value>> {
        value.as_object().cloned()
    }

    #[test]
    fn test_signed_caller_uses_path_account() {
        let signals = IdentitySignals {
            signer_arn: Some("arn:aws:iam::123456789012:role/MailPlugin".to_string()),
            ..Default::default()
        };
        let caller = signals.resolve(Some("acct-1")).unwrap();
        assert_eq!(caller.account_id, "acct-1");
        assert!(caller.is_direct_signed());
        assert_eq!(caller.principal.as_deref(), Some("arn:aws:iam::123456789012:role/MailPlugin"));
    }

    #[test]
    fn test_caller_id_alone_is_direct_signed() {
        let signals = IdentitySignals {
            caller_id: Some("AIDAEXAMPLE".to_string()),
            ..Default::default()
        };
        let caller = signals.resolve(Some("acct-1")).unwrap();
        assert_eq!(caller.principal.as_deref(), Some("AIDAEXAMPLE"));
    }

    #[test]
    fn test_signed_caller_without_path_account() {
        let signals = IdentitySignals {
            signer_arn: Some("arn:aws:iam::123456789012:role/MailPlugin".to_string()),
            ..Default::default()
        };
        assert_eq!(signals.resolve(None).unwrap_err().kind(), ErrorKind::Unauthenticated);
        assert_eq!(signals.resolve(Some("")).unwrap_err().kind(), ErrorKind::Unauthenticated);
    }

    #[test]
    fn test_signed_caller_wins_over_claims() {
        let signals = IdentitySignals {
            signer_arn: Some("arn:aws:iam::123456789012:role/MailPlugin".to_string()),
            caller_id: None,
            claims: claims(json!({"sub": "user-9"})),
        };
        assert_eq!(signals.resolve(Some("acct-1")).unwrap().account_id, "acct-1");
    }

    #[test]
    fn test_session_uses_sub_claim() {
        let signals = IdentitySignals {
            claims: claims(json!({"sub": "user-9", "email": "u@example.com"})),
            ..Default::default()
        };
        let caller = signals.resolve(Some("acct-1")).unwrap();
        assert_eq!(caller.account_id, "user-9");
        assert!(!caller.is_direct_signed());
    }

    #[test]
    fn test_session_with_bad_sub() {
        for value in [json!({}), json!({"sub": ""}), json!({"sub": 42})] {
            let signals = IdentitySignals {
                claims: claims(value),
                ..Default::default()
            };
            assert_eq!(signals.resolve(Some("acct-1")).unwrap_err().kind(), ErrorKind::Unauthenticated);
        }
    }

    #[test]
    fn test_empty_signals_are_not_a_context() {
        let signals = IdentitySignals {
            signer_arn: Some(String::new()),
            caller_id: Some(String::new()),
            claims: None,
        };
        let err = signals.resolve(Some("acct-1")).unwrap_err();
        assert_eq!(err.to_string(), "no authentication context present");
    }

    #[test]
    fn test_authorize_account() {
        let registry = PrincipalRegistry::from_principals(["arn:aws:iam::123456789012:role/MailPlugin"]);
        let plugin = IdentitySignals {
            signer_arn: Some("arn:aws:iam::123456789012:role/MailPlugin".to_string()),
            ..Default::default()
        };
        assert!(authorize_account(&plugin, &registry, "acct-1").is_ok());

        let stranger = IdentitySignals {
            caller_id: Some("AIDAEXAMPLE".to_string()),
            ..Default::default()
        };
        assert_eq!(
            authorize_account(&stranger, &registry, "acct-1").unwrap_err().kind(),
            ErrorKind::Forbidden
        );

        let user = IdentitySignals {
            claims: claims(json!({"sub": "user-9"})),
            ..Default::default()
        };
        assert!(authorize_account(&user, &registry, "user-9").is_ok());
        let err = authorize_account(&user, &registry, "acct-1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.to_string(), "Account mismatch");
    }
}
