mod common;

use pkgfetch_client::{CertificateInfo, CertificateVerifier, VerifyCode};

fn info(common_name: &str, not_before: (i32, u8, u8), not_after: (i32, u8, u8)) -> CertificateInfo {
    let (cert, _key) = common::self_signed(common_name, not_before, not_after);
    CertificateInfo::from_der(cert.der()).expect("parse generated certificate")
}

#[test]
fn parses_subject_issuer_and_validity() {
    let cert = info("rubygems.test", (2013, 1, 2), (2014, 1, 2));
    assert_eq!(cert.subject, "/CN=rubygems.test");
    assert_eq!(cert.issuer, "/CN=rubygems.test");
    assert!(cert.is_self_issued());
    assert_eq!(cert.not_before_iso8601(), "2013-01-02T00:00:00Z");
}

#[test]
fn expired_message_reports_the_start_of_validity() {
    let cert = info("expired.test", (2013, 1, 2), (2014, 1, 2));
    let message = CertificateVerifier::new().message_for(VerifyCode::CERT_HAS_EXPIRED, &cert);
    assert_eq!(
        message.as_deref(),
        Some("Certificate /CN=expired.test expired at 2013-01-02T00:00:00Z")
    );
}

#[test]
fn every_specialized_code_has_a_message() {
    let cert = info("mirror.test", (2020, 1, 1), (2030, 1, 1));
    let verifier = CertificateVerifier::new();
    let expected = [
        (
            VerifyCode::CERT_NOT_YET_VALID,
            "Certificate /CN=mirror.test not valid until 2020-01-01T00:00:00Z",
        ),
        (VerifyCode::CERT_REJECTED, "Certificate /CN=mirror.test is rejected"),
        (VerifyCode::CERT_UNTRUSTED, "Certificate /CN=mirror.test is not trusted"),
        (
            VerifyCode::DEPTH_ZERO_SELF_SIGNED_CERT,
            "Certificate /CN=mirror.test is not trusted",
        ),
        (
            VerifyCode::INVALID_CA,
            "Certificate /CN=mirror.test is an invalid CA certificate",
        ),
        (
            VerifyCode::INVALID_PURPOSE,
            "Certificate /CN=mirror.test has an invalid purpose",
        ),
        (
            VerifyCode::SELF_SIGNED_CERT_IN_CHAIN,
            "Root certificate is not trusted (/CN=mirror.test)",
        ),
        (
            VerifyCode::UNABLE_TO_GET_ISSUER_CERT_LOCALLY,
            "You must add /CN=mirror.test to your local trusted store",
        ),
        (
            VerifyCode::UNABLE_TO_VERIFY_LEAF_SIGNATURE,
            "Cannot verify certificate issued by /CN=mirror.test",
        ),
    ];

    for (code, message) in expected {
        assert_eq!(
            verifier.message_for(code, &cert).as_deref(),
            Some(message),
            "message for {code}"
        );
    }
}

#[test]
fn unknown_codes_get_only_the_generic_line() {
    let cert = info("mirror.test", (2020, 1, 1), (2030, 1, 1));
    let verifier = CertificateVerifier::new();
    assert_eq!(verifier.message_for(VerifyCode::CERT_REVOKED, &cert), None);

    let decision = verifier.on_verify_failure(VerifyCode::CERT_REVOKED, Some(&cert), 0);
    assert_eq!(
        decision.diagnostic().lines(),
        &["SSL verification error at depth 0: certificate revoked (23)".to_string()]
    );
}

#[test]
fn failure_reports_code_description_and_explanation() {
    let cert = info("self.test", (2020, 1, 1), (2030, 1, 1));
    let decision = CertificateVerifier::new().on_verify_failure(
        VerifyCode::DEPTH_ZERO_SELF_SIGNED_CERT,
        Some(&cert),
        0,
    );

    let diagnostic = decision.diagnostic();
    assert_eq!(
        diagnostic.lines()[0],
        "SSL verification error at depth 0: self-signed certificate (18)"
    );
    assert_eq!(
        diagnostic.explanation(),
        Some("Certificate /CN=self.test is not trusted")
    );
}
