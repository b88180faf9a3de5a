use git_sigstash::{
    error::Error,
    stream::{transcode, Mode, TranscodeStats},
};

const SIGNATURE: &str = "-----BEGIN PGP SIGNATURE-----

iQEzBAABCAAdFiEEexampleexampleexampleexampleFAmYAAAAACgkQexample
=AbCd
-----END PGP SIGNATURE-----
";

fn data(payload: &str) -> String {
    format!("data {}\n{}", payload.len(), payload)
}

/// A stream shaped like `git fast-export --signed-commits=verbatim --show-original-ids`.
fn signed_export() -> String {
    let mut s = String::new();
    s.push_str("blob\nmark :1\n");
    s.push_str(&data("first file\n"));
    s.push('\n');
    s.push_str("reset refs/heads/main\n");
    s.push_str("commit refs/heads/main\nmark :2\n");
    s.push_str("original-oid 1111111111111111111111111111111111111111\n");
    s.push_str("author A U Thor <author@example.com> 1700000000 +0000\n");
    s.push_str("committer C O Mitter <committer@example.com> 1700000000 +0000\n");
    s.push_str("gpgsig sha1 openpgp\n");
    s.push_str(&data(SIGNATURE));
    s.push_str(&data("Initial commit\n"));
    s.push_str("M 100644 :1 README\n\n");
    s.push_str("commit refs/heads/main\nmark :3\n");
    s.push_str("original-oid 2222222222222222222222222222222222222222\n");
    s.push_str("author A U Thor <author@example.com> 1700000100 +0000\n");
    s.push_str("committer C O Mitter <committer@example.com> 1700000100 +0000\n");
    s.push_str(&data("Unsigned follow-up\n\nWith a body.\n"));
    s.push_str("from :2\n\n");
    s.push_str("commit refs/heads/main\nmark :4\n");
    s.push_str("original-oid 3333333333333333333333333333333333333333\n");
    s.push_str("author A U Thor <author@example.com> 1700000200 +0000\n");
    s.push_str("committer C O Mitter <committer@example.com> 1700000200 +0000\n");
    s.push_str("gpgsig sha1 ssh\n");
    s.push_str(&data("-----BEGIN SSH SIGNATURE-----\nU1NIU0lH\n-----END SSH SIGNATURE-----\n"));
    s.push_str("encoding ISO-8859-1\n");
    s.push_str(&data("Third\n"));
    s.push_str("from :3\nD README\n\n");
    s
}

fn run(mode: Mode, input: &[u8]) -> (Vec<u8>, TranscodeStats) {
    let mut output = Vec::new();
    let stats = transcode(mode, input, &mut output).unwrap();
    (output, stats)
}

/// Walk a stream honoring every `data` count and check that each line outside
/// a block is a fast-import command. An off-by-one count lands mid-payload and
/// trips the check.
fn assert_framing(stream: &[u8]) {
    const COMMANDS: &[&str] = &[
        "blob", "mark ", "reset ", "commit ", "original-oid ", "author ", "committer ",
        "gpgsig ", "encoding ", "from ", "merge ", "M ", "D ", "tag ", "tagger ",
    ];
    let mut rest = stream;
    while !rest.is_empty() {
        let end = rest.iter().position(|&b| b == b'\n').map_or(rest.len(), |i| i + 1);
        let line = std::str::from_utf8(&rest[..end]).unwrap();
        rest = &rest[end..];

        if let Some(count) = line.strip_prefix("data ") {
            let count: usize = count.trim_end().parse().unwrap();
            assert!(count <= rest.len(), "data {} overruns the stream", count);
            rest = &rest[count..];
            continue;
        }
        assert!(
            line == "\n" || COMMANDS.iter().any(|c| line.starts_with(c)),
            "unexpected line outside a data block: {:?}",
            line
        );
    }
}

#[test]
fn test_store_then_restore_is_lossless() {
    let original = signed_export();

    let (stored, store_stats) = run(Mode::Store, original.as_bytes());
    assert_eq!(
        store_stats,
        TranscodeStats {
            commits: 3,
            signatures: 2
        }
    );
    let stored_text = String::from_utf8(stored.clone()).unwrap();
    assert!(!stored_text.contains("\ngpgsig "));
    assert_eq!(stored_text.matches("\n\noriginal_gpgsig ").count(), 2);
    assert_framing(&stored);

    let (restored, restore_stats) = run(Mode::Restore, &stored);
    assert_eq!(restore_stats.signatures, 2);
    assert_eq!(String::from_utf8(restored).unwrap(), original);
}

#[test]
fn test_unsigned_stream_is_untouched() {
    let stream = signed_export()
        .replace("gpgsig sha1 openpgp\n", "")
        .replace(&data(SIGNATURE), "")
        .replace("gpgsig sha1 ssh\n", "")
        .replace(
            &data("-----BEGIN SSH SIGNATURE-----\nU1NIU0lH\n-----END SSH SIGNATURE-----\n"),
            "",
        );

    for mode in [Mode::Store, Mode::Restore] {
        let (output, stats) = run(mode, stream.as_bytes());
        assert_eq!(output, stream.as_bytes());
        assert_eq!(stats.commits, 3);
        assert_eq!(stats.signatures, 0);
    }
}

#[test]
fn test_tag_message_with_marker_is_not_inspected() {
    let stream = format!(
        "reset refs/tags/v1\n\
         tag v1\n\
         from :2\n\
         tagger T <t@example.com> 1700000000 +0000\n\
         {}\n",
        data("Release\n\noriginal_gpgsig sha1 openpgp\nnot a commit\n")
    );

    let (output, stats) = run(Mode::Restore, stream.as_bytes());
    assert_eq!(output, stream.as_bytes());
    assert_eq!(stats, TranscodeStats::default());
}

#[test]
fn test_store_example_scenario() {
    let input = "commit refs/heads/main\n\
                 committer C <c@example.com> 0 +0000\n\
                 gpgsig rsa\n\
                 data 3\n\
                 ABC\n\
                 data 5\n\
                 Hello\n";
    let (output, stats) = run(Mode::Store, input.as_bytes());

    let output = String::from_utf8(output).unwrap();
    assert_eq!(
        output,
        "commit refs/heads/main\n\
         committer C <c@example.com> 0 +0000\n\
         data 30\n\
         Hello\n\noriginal_gpgsig rsa\nABC\n\
         \n"
    );
    assert_eq!(stats.signatures, 1);
    assert_framing(output.as_bytes());
}

#[test]
fn test_restore_example_scenario() {
    let input = format!(
        "commit refs/heads/main\ncommitter C <c@example.com> 0 +0000\n{}\n\n",
        data("Hello\n\noriginal_gpgsig rsa\nABC")
    );
    let (output, stats) = run(Mode::Restore, input.as_bytes());

    assert_eq!(
        String::from_utf8(output).unwrap(),
        "commit refs/heads/main\n\
         committer C <c@example.com> 0 +0000\n\
         gpgsig rsa\n\
         data 3\n\
         ABC\n\
         data 6\n\
         Hello\n\
         \n"
    );
    assert_eq!(stats.signatures, 1);
}

#[test]
fn test_malformed_marker_passes_through() {
    let input = format!(
        "commit refs/heads/main\ncommitter C <c@example.com> 0 +0000\n{}\n\n",
        data("Hello\n\noriginal_gpgsig")
    );
    let (output, stats) = run(Mode::Restore, input.as_bytes());
    assert_eq!(output, input.as_bytes());
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.signatures, 0);
}

#[test]
fn test_empty_message_framing() {
    let input = "commit refs/heads/main\n\
                 committer C <c@example.com> 0 +0000\n\
                 gpgsig x\n\
                 data 4\n\
                 SIG\n\
                 data 0\n\
                 \n";
    let (stored, _) = run(Mode::Store, input.as_bytes());
    assert_framing(&stored);
    assert!(String::from_utf8(stored.clone())
        .unwrap()
        .contains("data 24\n\n\noriginal_gpgsig x\nSIG\n"));

    let (restored, stats) = run(Mode::Restore, &stored);
    assert_framing(&restored);
    assert_eq!(stats.signatures, 1);
    assert_eq!(String::from_utf8(restored).unwrap(), input);
}

#[test]
fn test_store_example_restores_to_its_signature_block() {
    let input = "commit refs/heads/main\n\
                 committer C <c@example.com> 0 +0000\n\
                 gpgsig rsa\n\
                 data 3\n\
                 ABC\n\
                 data 6\n\
                 Hello\n\
                 \n";
    let (stored, _) = run(Mode::Store, input.as_bytes());
    let (restored, stats) = run(Mode::Restore, &stored);

    assert_eq!(String::from_utf8(restored).unwrap(), input);
    assert_eq!(stats.signatures, 1);
}

#[test]
fn test_inline_file_data_is_copied_by_count() {
    let input = format!(
        "commit refs/heads/main\n\
         committer C <c@example.com> 0 +0000\n\
         {}\
         M 100644 inline notes.txt\n\
         {}\n\
         \n",
        data("Add notes\n"),
        data("commit refs/heads/fake\n\nnot a record\n")
    );
    for mode in [Mode::Store, Mode::Restore] {
        let (output, stats) = run(mode, input.as_bytes());
        assert_eq!(output, input.as_bytes());
        assert_eq!(stats.commits, 1);
    }
}

#[test]
fn test_gpgsig_followed_by_header_is_a_framing_error() {
    let input = "commit refs/heads/main\n\
                 gpgsig rsa\n\
                 committer C <c@example.com> 0 +0000\n\
                 data 2\nhi\n";
    match transcode(Mode::Store, input.as_bytes(), Vec::new()) {
        Err(Error::Protocol(msg)) => assert!(msg.contains("gpgsig"), "{}", msg),
        other => panic!("expected protocol error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_truncated_signature_block() {
    let input = "commit refs/heads/main\ngpgsig rsa\ndata 50\nABC";
    assert!(matches!(
        transcode(Mode::Store, input.as_bytes(), Vec::new()),
        Err(Error::Truncated {
            context: "signature block",
            ..
        })
    ));
}
