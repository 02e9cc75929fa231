use std::io::Write;

use assert_cmd::Command;
use certsvc::fixtures;
use pem::{Label, Pem};
use predicates::prelude::*;
use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;

fn cryptowrap() -> Command {
    Command::cargo_bin("cryptowrap").unwrap()
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

fn path(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().to_string()
}

#[test]
fn test_crl_inspect_text() {
    let crl = write_temp(&fixtures::crl_with_revoked(&[&[0x01]]));
    cryptowrap()
        .args(["crl", "inspect", &path(&crl)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Certificate Revocation List (CRL):"))
        .stdout(predicate::str::contains("Version: 2 (0x1)"))
        .stdout(predicate::str::contains("Issuer: CN=Fixture CA"))
        .stdout(predicate::str::contains("Last Update: Jan 01 00:00:00 2024 GMT"))
        .stdout(predicate::str::contains("2.5.29.20: 02"))
        .stdout(predicate::str::contains("Serial Number: 01"))
        .stdout(predicate::str::contains("2.5.29.21: Key Compromise (1)"));
}

#[test]
fn test_crl_inspect_empty_from_pem_stdin() {
    let pem = Pem::new(Label::X509Crl, fixtures::empty_crl()).to_string();
    cryptowrap()
        .args(["crl", "inspect"])
        .write_stdin(pem)
        .assert()
        .success()
        .stdout(predicate::str::contains("No Revoked Certificates."));
}

#[test]
fn test_crl_inspect_json() {
    let crl = write_temp(&fixtures::crl_with_revoked(&[&[0x01]]));
    cryptowrap()
        .args(["crl", "inspect", &path(&crl), "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"issuer_name\": \"CN=Fixture CA\""))
        .stdout(predicate::str::contains("\"entries\""));
}

#[test]
fn test_crl_check() {
    let crl = write_temp(&fixtures::crl_with_revoked(&[&[0x01]]));
    let revoked = write_temp(&fixtures::certificate(&[0x01]));
    let valid = write_temp(&fixtures::certificate(&[0x02]));

    cryptowrap()
        .args(["crl", "inspect", &path(&crl), "--check", &path(&revoked)])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Revoked: serial 01 on Dec 24 00:00:00 2023 GMT",
        ));
    cryptowrap()
        .args(["crl", "inspect", &path(&crl), "--check", &path(&valid)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not revoked"));
}

#[test]
fn test_crl_inspect_rejects_garbage() {
    let garbage = write_temp(b"not a revocation list");
    cryptowrap()
        .args(["crl", "inspect", &path(&garbage)])
        .assert()
        .failure();
}

#[test]
fn test_ctl_inspect_sorted() {
    let ctl = write_temp(&fixtures::ctl(&[&[0x22; 20], &[0x11; 20]]));
    cryptowrap()
        .args(["ctl", "inspect", &path(&ctl)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subject Usage: 1.3.6.1.5.5.7.3.3"))
        .stdout(predicate::str::contains("Sequence Number: 07"))
        .stdout(predicate::function(|out: &str| {
            let first = out.find(&"11".repeat(20));
            let second = out.find(&"22".repeat(20));
            matches!((first, second), (Some(a), Some(b)) if a < b)
        }));
}

#[test]
fn test_ctl_inspect_json() {
    let ctl = write_temp(&fixtures::ctl(&[&[0x11; 20]]));
    cryptowrap()
        .args(["ctl", "inspect", &path(&ctl), "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"subject_usage\""))
        .stdout(predicate::str::contains("\"sorted_subjects\""));
}

#[test]
fn test_ctl_lookup_by_identifier() {
    let ctl = write_temp(&fixtures::ctl(&[&[0x11; 20]]));
    cryptowrap()
        .args(["ctl", "inspect", &path(&ctl), "--subject", &"11".repeat(20)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found:"));
    cryptowrap()
        .args(["ctl", "inspect", &path(&ctl), "--subject", &"33".repeat(20)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not found"));
    cryptowrap()
        .args(["ctl", "inspect", &path(&ctl), "--subject", "xyz"])
        .assert()
        .failure();
}

#[test]
fn test_ctl_lookup_by_certificate() {
    let certificate = fixtures::certificate(&[0x09]);
    let identifier = Sha1::digest(&certificate).to_vec();
    let ctl = write_temp(&fixtures::ctl(&[identifier.as_slice()]));
    let cert = write_temp(&certificate);
    cryptowrap()
        .args(["ctl", "inspect", &path(&ctl), "--cert", &path(&cert)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found:"))
        .stdout(predicate::str::contains("1.3.6.1.4.1.311.10.11.11: 1 value(s)"));
}
