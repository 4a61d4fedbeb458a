// Copyright 2024 The playattest Authors.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::finding::{Category, Finding, FindingKind, Severity};
use super::trustpolicy::{ErrorLevel, Policy};
use crate::nonce::{ConsumeResult, Nonce, NonceRegistry};
use crate::token::{
    AccountDetails, AppIntegrity, AttestationStatement, DeviceIntegrity, RequestDetails,
    LICENSED, MEETS_BASIC_INTEGRITY, MEETS_DEVICE_INTEGRITY, MEETS_STRONG_INTEGRITY,
    MEETS_VIRTUAL_INTEGRITY, PLAY_RECOGNIZED,
};
use std::ops::ControlFlow;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Whether the statement's nonce is checked against the registry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NonceCheck {
    #[default]
    Server,
    /// The client vouches for freshness itself; the nonce is not looked up
    Device,
}

impl FromStr for NonceCheck {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" => Ok(NonceCheck::Server),
            "device" => Ok(NonceCheck::Device),
            unknown => Err(Error::UnknownNonceCheck(unknown.to_string())),
        }
    }
}

/// Proof that a statement passed every policy check.  Only the validator can
/// mint one, and issuing a credential uses it up.
#[derive(Debug)]
#[must_use]
pub struct Approval {
    _sealed: (),
}

impl Approval {
    fn new() -> Self {
        Approval { _sealed: () }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Approval::new()
    }
}

/// The outcome of a policy evaluation
#[derive(Debug)]
pub struct Appraisal {
    findings: Vec<Finding>,
    approval: Option<Approval>,
}

impl Appraisal {
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn is_accepted(&self) -> bool {
        self.approval.is_some()
    }

    /// The approval when the statement was accepted, the findings otherwise
    pub fn into_result(self) -> Result<Approval, Vec<Finding>> {
        self.approval.ok_or(self.findings)
    }
}

/// Collects findings, and tells the caller whether to carry on
struct Findings {
    level: ErrorLevel,
    list: Vec<Finding>,
}

impl Findings {
    fn new(level: ErrorLevel) -> Self {
        Self {
            level,
            list: Vec::new(),
        }
    }

    fn raise(
        &mut self,
        category: Category,
        kind: FindingKind,
        severity: Severity,
        reason: impl Into<String>,
    ) -> ControlFlow<()> {
        let finding = Finding {
            category,
            kind,
            severity,
            reason: reason.into(),
        };

        warn!(
            category = %finding.category,
            code = finding.kind.code(),
            severity = ?finding.severity,
            error_level = %self.level,
            "{}",
            finding.reason
        );

        self.list.push(finding);

        if self.level.is_fail_fast() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn passed_since(&self, category: Category, mark: usize) {
        if self.list.len() == mark {
            info!(category = %category, "statement section is valid");
        }
    }

    fn into_appraisal(self) -> Appraisal {
        if self.list.is_empty() {
            info!("statement accepted");

            Appraisal {
                findings: self.list,
                approval: Some(Approval::new()),
            }
        } else {
            warn!(findings = self.list.len(), "statement rejected");

            Appraisal {
                findings: self.list,
                approval: None,
            }
        }
    }
}

/// Evaluates a verified statement against the operator [`Policy`].
///
/// The request details, app integrity, device integrity and account details
/// sections are checked in that order.  Under [`ErrorLevel::Log`] all of them
/// are evaluated; otherwise evaluation stops at the first finding.  Any
/// finding rejects the statement.
#[derive(Clone)]
pub struct PolicyValidator {
    policy: Arc<Policy>,
    nonces: NonceRegistry,
}

impl PolicyValidator {
    pub fn new(policy: Policy, nonces: NonceRegistry) -> Self {
        Self {
            policy: Arc::new(policy),
            nonces,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn nonces(&self) -> &NonceRegistry {
        &self.nonces
    }

    pub async fn evaluate(
        &self,
        statement: &AttestationStatement,
        nonce_check: NonceCheck,
    ) -> Appraisal {
        let now_ms = chrono::Utc::now().timestamp_millis();

        self.evaluate_at(statement, nonce_check, now_ms).await
    }

    /// As [`PolicyValidator::evaluate`], with the current time supplied
    pub async fn evaluate_at(
        &self,
        statement: &AttestationStatement,
        nonce_check: NonceCheck,
        now_ms: i64,
    ) -> Appraisal {
        let mut findings = Findings::new(self.policy.error_level);

        // a Break only means evaluation stopped early
        let _ = self
            .appraise(statement, nonce_check, now_ms, &mut findings)
            .await;

        findings.into_appraisal()
    }

    async fn appraise(
        &self,
        s: &AttestationStatement,
        nonce_check: NonceCheck,
        now_ms: i64,
        f: &mut Findings,
    ) -> ControlFlow<()> {
        self.appraise_request_details(s.request_details.as_ref(), nonce_check, now_ms, f)
            .await?;
        self.appraise_app_integrity(s.app_integrity.as_ref(), f)?;
        appraise_device_integrity(s.device_integrity.as_ref(), f)?;
        appraise_account_details(s.account_details.as_ref(), f)
    }

    async fn appraise_request_details(
        &self,
        rd: Option<&RequestDetails>,
        nonce_check: NonceCheck,
        now_ms: i64,
        f: &mut Findings,
    ) -> ControlFlow<()> {
        const C: Category = Category::RequestDetails;

        let Some(rd) = rd else {
            return f.raise(
                C,
                FindingKind::MissingRequestDetails,
                Severity::Critical,
                "requestDetails not found in statement",
            );
        };

        let mark = f.len();

        if nonce_check == NonceCheck::Server {
            if let Some((severity, reason)) = self.redeem(rd.nonce.as_deref()).await {
                f.raise(C, FindingKind::InvalidNonce, severity, reason)?;
            }
        }

        if rd.request_package_name.as_deref() != Some(self.policy.package_name.as_str()) {
            f.raise(
                C,
                FindingKind::PackageMismatch,
                Severity::Critical,
                format!(
                    "requestPackageName is {}",
                    rd.request_package_name.as_deref().unwrap_or("missing")
                ),
            )?;
        }

        match rd.timestamp_millis {
            Some(ts) if now_ms.saturating_sub(ts) <= self.policy.freshness_window_ms => {}
            Some(ts) => f.raise(
                C,
                FindingKind::StaleRequest,
                Severity::Warning,
                format!("request is {} ms old", now_ms.saturating_sub(ts)),
            )?,
            None => f.raise(
                C,
                FindingKind::StaleRequest,
                Severity::Warning,
                "request timestamp is missing",
            )?,
        }

        f.passed_since(C, mark);

        ControlFlow::Continue(())
    }

    /// Redeem the statement's nonce, returning what is wrong with it if
    /// anything
    async fn redeem(&self, nonce: Option<&str>) -> Option<(Severity, String)> {
        let Some(v) = nonce else {
            return Some((Severity::Critical, "nonce is missing".to_string()));
        };

        let nonce = match Nonce::from_transport(v) {
            Ok(n) => n,
            Err(e) => return Some((Severity::Critical, format!("nonce does not decode: {e}"))),
        };

        match self.nonces.try_consume(&nonce).await {
            Ok(ConsumeResult::Accepted) => None,
            Ok(ConsumeResult::Replayed) => Some((
                Severity::Critical,
                "nonce has already been used".to_string(),
            )),
            Ok(ConsumeResult::Unknown) => Some((
                Severity::Warning,
                "nonce was not issued by this server".to_string(),
            )),
            Err(e) => Some((
                Severity::Critical,
                format!("nonce could not be redeemed: {e}"),
            )),
        }
    }

    fn appraise_app_integrity(&self, ai: Option<&AppIntegrity>, f: &mut Findings) -> ControlFlow<()> {
        const C: Category = Category::AppIntegrity;

        let Some(ai) = ai else {
            return f.raise(
                C,
                FindingKind::MissingAppIntegrity,
                Severity::Critical,
                "appIntegrity not found in statement",
            );
        };

        let mark = f.len();

        if ai.app_recognition_verdict.as_deref() != Some(PLAY_RECOGNIZED) {
            f.raise(
                C,
                FindingKind::AppNotRecognized,
                Severity::Critical,
                format!(
                    "appRecognitionVerdict is {}",
                    ai.app_recognition_verdict.as_deref().unwrap_or("missing")
                ),
            )?;
        }

        if ai.package_name.as_deref() != Some(self.policy.package_name.as_str()) {
            f.raise(
                C,
                FindingKind::PackageMismatch,
                Severity::Critical,
                format!(
                    "packageName is {}",
                    ai.package_name.as_deref().unwrap_or("missing")
                ),
            )?;
        }

        let trusted = ai
            .certificate_sha256_digest
            .as_ref()
            .is_some_and(|ds| ds.iter().any(|d| self.policy.is_trusted_digest(d)));

        if !trusted {
            f.raise(
                C,
                FindingKind::InvalidCertificateDigest,
                Severity::Critical,
                "no certificateSha256Digest matches a trusted certificate",
            )?;
        }

        f.passed_since(C, mark);

        ControlFlow::Continue(())
    }
}

fn appraise_device_integrity(di: Option<&DeviceIntegrity>, f: &mut Findings) -> ControlFlow<()> {
    const C: Category = Category::DeviceIntegrity;

    let Some(di) = di else {
        return f.raise(
            C,
            FindingKind::MissingDeviceIntegrity,
            Severity::Critical,
            "deviceIntegrity not found in statement",
        );
    };

    // an emulator verdict wins over anything else reported alongside it
    if di.has_marker(MEETS_VIRTUAL_INTEGRITY) {
        return f.raise(
            C,
            FindingKind::EmulatorDetected,
            Severity::Critical,
            "emulator got attested",
        );
    }

    let meets = [
        MEETS_BASIC_INTEGRITY,
        MEETS_DEVICE_INTEGRITY,
        MEETS_STRONG_INTEGRITY,
    ]
    .iter()
    .any(|m| di.has_marker(m));

    if !meets {
        return f.raise(
            C,
            FindingKind::InsufficientDeviceIntegrity,
            Severity::Critical,
            "deviceRecognitionVerdict carries no integrity marker",
        );
    }

    info!(
        category = %C,
        verdict = ?di.device_recognition_verdict,
        "statement section is valid"
    );

    ControlFlow::Continue(())
}

fn appraise_account_details(ad: Option<&AccountDetails>, f: &mut Findings) -> ControlFlow<()> {
    const C: Category = Category::AccountDetails;

    let Some(ad) = ad else {
        return f.raise(
            C,
            FindingKind::MissingAccountDetails,
            Severity::Critical,
            "accountDetails not found in statement",
        );
    };

    if ad.app_licensing_verdict.as_deref() != Some(LICENSED) {
        return f.raise(
            C,
            FindingKind::UnlicensedApp,
            Severity::Warning,
            format!(
                "appLicensingVerdict is {}",
                ad.app_licensing_verdict.as_deref().unwrap_or("missing")
            ),
        );
    }

    info!(category = %C, "statement section is valid");

    ControlFlow::Continue(())
}
