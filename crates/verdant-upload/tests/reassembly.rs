/// Integration tests: push parts through the reassembler the way the station
/// does and verify the assembled file byte-for-byte.

use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tempfile::TempDir;

use verdant_upload::{
    ChunkStore, ChunkUpload, MAX_PARTS, Outcome, Reassembler, UploadError, crc32,
    split_for_upload,
};

async fn reassembler(root: &TempDir) -> Reassembler {
    let store = ChunkStore::new(root.path().join("temp_parts")).await.unwrap();
    Reassembler::new(store, root.path().join("uploads"))
        .await
        .unwrap()
}

/// Deterministic bytes covering every value, prime modulus for spread.
fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7 + i / 251) % 251) as u8).collect()
}

fn sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

#[tokio::test]
async fn three_parts_in_order_reassemble_exactly() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let original = sample_bytes(4096 + 4096 + 1234);
    let parts = split_for_upload("plant.jpg", &original, 4096);
    assert_eq!(parts.len(), 3);

    let first = engine.accept_chunk(&parts[0]).await.unwrap();
    assert_eq!(first, Outcome::Accepted { part: 1 });
    let second = engine.accept_chunk(&parts[1]).await.unwrap();
    assert_eq!(second, Outcome::Accepted { part: 2 });

    let Outcome::Completed { artifact, size } = engine.accept_chunk(&parts[2]).await.unwrap()
    else {
        panic!("expected completion");
    };
    assert_eq!(size, 9426);
    assert_eq!(artifact, root.path().join("uploads").join("plant.jpg"));

    let assembled = read(&artifact);
    assert_eq!(assembled.len(), 9426);
    assert_eq!(sha256(&assembled), sha256(&original));

    // parts are consumed
    for part in 1..=3 {
        assert!(matches!(
            engine.store().get("plant.jpg", part).await,
            Err(UploadError::ChunkNotFound { .. })
        ));
    }
}

#[tokio::test]
async fn out_of_order_parts_with_last_part_last() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let original = sample_bytes(10_000);
    let parts = split_for_upload("shuffled.png", &original, 1500);
    assert_eq!(parts.len(), 7);

    for idx in [4, 0, 5, 2, 1, 3] {
        let outcome = engine.accept_chunk(&parts[idx]).await.unwrap();
        assert_eq!(outcome, Outcome::Accepted { part: idx as u32 + 1 });
    }

    let outcome = engine.accept_chunk(&parts[6]).await.unwrap();
    let Outcome::Completed { artifact, .. } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(read(&artifact), original);
}

#[tokio::test]
async fn tampered_part_is_rejected_and_not_stored() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let parts = split_for_upload("cam.jpg", &sample_bytes(300), 100);

    let mut tampered = parts[1].clone();
    let mut bytes = tampered.payload.into_bytes();
    bytes[5] ^= 0x01;
    tampered.payload = String::from_utf8(bytes).unwrap();

    let err = engine.accept_chunk(&tampered).await.unwrap_err();
    assert!(matches!(
        err,
        UploadError::ChecksumMismatch { part: 2, ref file, .. } if file == "cam.jpg"
    ));
    assert_eq!(err.part(), Some(2));
    assert!(matches!(
        engine.store().get("cam.jpg", 2).await,
        Err(UploadError::ChunkNotFound { .. })
    ));

    // A tampered resend does not clobber a good part already stored.
    engine.accept_chunk(&parts[1]).await.unwrap();
    assert!(engine.accept_chunk(&tampered).await.is_err());
    assert_eq!(
        engine.store().get("cam.jpg", 2).await.unwrap(),
        parts[1].payload.as_bytes()
    );
}

#[tokio::test]
async fn missing_middle_part_keeps_progress() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let original = sample_bytes(3000);
    let parts = split_for_upload("gap.jpg", &original, 1000);

    engine.accept_chunk(&parts[0]).await.unwrap();
    let err = engine.accept_chunk(&parts[2]).await.unwrap_err();
    match &err {
        UploadError::IncompleteSequence { file, total, missing } => {
            assert_eq!(file, "gap.jpg");
            assert_eq!(*total, 3);
            assert_eq!(missing, &vec![2]);
        }
        other => panic!("expected IncompleteSequence, got {other:?}"),
    }
    assert_eq!(err.part(), Some(2));

    assert!(engine.store().get("gap.jpg", 1).await.is_ok());
    assert!(engine.store().get("gap.jpg", 3).await.is_ok());
    assert!(!engine.artifact_path("gap.jpg").exists());

    // Resend the missing part, then the last one again.
    assert_eq!(
        engine.accept_chunk(&parts[1]).await.unwrap(),
        Outcome::Accepted { part: 2 }
    );
    let Outcome::Completed { artifact, .. } = engine.accept_chunk(&parts[2]).await.unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(read(&artifact), original);
}

#[tokio::test]
async fn trimmed_padding_still_decodes() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    // 4 bytes -> "AQIDBA==", 5 bytes -> "BQYHCAk="
    let original: Vec<u8> = (1..=9).collect();

    let p1 = "AQIDBA".to_string();
    let p2 = "BQYHCAk".to_string();
    let first = ChunkUpload {
        file_id: "pad.bin".into(),
        part: 1,
        total_parts: 2,
        crc32: crc32(p1.as_bytes()),
        payload: p1,
    };
    let second = ChunkUpload {
        file_id: "pad.bin".into(),
        part: 2,
        total_parts: 2,
        crc32: crc32(p2.as_bytes()),
        payload: p2,
    };

    engine.accept_chunk(&first).await.unwrap();
    let Outcome::Completed { artifact, size } = engine.accept_chunk(&second).await.unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(size, 9);
    assert_eq!(read(&artifact), original);
}

#[tokio::test]
async fn line_wrapped_payload_is_cleaned_before_storage() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let original = sample_bytes(500);
    let mut parts = split_for_upload("wrapped.jpg", &original, 500);
    let part = &mut parts[0];

    // MIME-style 76 column wrapping; checksum stays over the clean text.
    let wrapped: Vec<String> = part
        .payload
        .as_bytes()
        .chunks(76)
        .map(|line| String::from_utf8(line.to_vec()).unwrap())
        .collect();
    part.payload = wrapped.join("\r\n") + "\n";

    let Outcome::Completed { artifact, .. } = engine.accept_chunk(part).await.unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(read(&artifact), original);
}

#[tokio::test]
async fn resending_a_part_does_not_duplicate_bytes() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let original = sample_bytes(2500);
    let parts = split_for_upload("retry.jpg", &original, 1000);

    engine.accept_chunk(&parts[0]).await.unwrap();
    engine.accept_chunk(&parts[0]).await.unwrap();
    engine.accept_chunk(&parts[1]).await.unwrap();
    engine.accept_chunk(&parts[1]).await.unwrap();
    let Outcome::Completed { artifact, size } = engine.accept_chunk(&parts[2]).await.unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(size, 2500);
    assert_eq!(read(&artifact), original);
}

#[tokio::test]
async fn reupload_overwrites_artifact() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;

    for content in [sample_bytes(700), vec![42u8; 64]] {
        for part in split_for_upload("same.jpg", &content, 256) {
            engine.accept_chunk(&part).await.unwrap();
        }
        assert_eq!(read(&engine.artifact_path("same.jpg")), content);
    }
}

#[tokio::test]
async fn undecodable_part_aborts_without_cleanup() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let payload = "QUJD RA==".to_string();
    let bad = ChunkUpload {
        file_id: "bad.jpg".into(),
        part: 1,
        total_parts: 1,
        crc32: crc32(payload.as_bytes()),
        payload,
    };

    let err = engine.accept_chunk(&bad).await.unwrap_err();
    assert!(matches!(err, UploadError::InvalidEncoding { part: 1, .. }));
    assert!(engine.store().get("bad.jpg", 1).await.is_ok());
    assert!(!engine.artifact_path("bad.jpg").exists());

    // no partial artifact left in the output directory
    let leftovers = std::fs::read_dir(engine.output_dir()).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn invalid_request_has_no_side_effect() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let mut part = split_for_upload("x.jpg", b"hello", 16).remove(0);
    part.part = 2;

    assert!(matches!(
        engine.accept_chunk(&part).await,
        Err(UploadError::MissingOrInvalidField(_))
    ));
    assert_eq!(engine.store().received("x.jpg", 2).await.unwrap().received(), 0);
}

#[tokio::test]
async fn oversized_total_parts_is_cheap_to_reject() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let payload = "QUJD".to_string();
    let lone_last = |total: u32| ChunkUpload {
        file_id: "huge.jpg".into(),
        part: total,
        total_parts: total,
        crc32: crc32(payload.as_bytes()),
        payload: payload.clone(),
    };

    let err = engine.accept_chunk(&lone_last(u32::MAX)).await.unwrap_err();
    assert!(matches!(err, UploadError::MissingOrInvalidField(_)));
    assert!(err.to_string().len() < 128);
    assert_eq!(engine.store().received("huge.jpg", 1).await.unwrap().received(), 0);

    // At the limit the gap report still stays short.
    let err = engine.accept_chunk(&lone_last(MAX_PARTS)).await.unwrap_err();
    match &err {
        UploadError::IncompleteSequence { missing, .. } => {
            assert_eq!(missing.len(), MAX_PARTS as usize - 1)
        }
        other => panic!("expected IncompleteSequence, got {other:?}"),
    }
    assert!(err.to_string().len() < 200);
    assert_eq!(err.part(), Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_last_parts_complete_once() {
    let root = tempfile::tempdir().unwrap();
    let engine = Arc::new(reassembler(&root).await);
    let original = sample_bytes(4000);
    let parts = split_for_upload("race.jpg", &original, 1000);

    for part in &parts[..3] {
        engine.accept_chunk(part).await.unwrap();
    }

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = engine.clone();
            let last = parts[3].clone();
            tokio::spawn(async move { engine.accept_chunk(&last).await })
        })
        .collect();

    let mut completed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(Outcome::Completed { .. }) => completed += 1,
            Err(UploadError::IncompleteSequence { .. }) => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(completed, 1);
    assert_eq!(read(&engine.artifact_path("race.jpg")), original);
}

#[tokio::test]
async fn idle_transfer_is_pruned_but_finished_artifact_stays() {
    let root = tempfile::tempdir().unwrap();
    let engine = reassembler(&root).await;
    let done = split_for_upload("done.jpg", &sample_bytes(200), 100);
    let idle = split_for_upload("idle.jpg", &sample_bytes(200), 100);

    for part in &done {
        engine.accept_chunk(part).await.unwrap();
    }
    engine.accept_chunk(&idle[0]).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(engine.prune_stale(std::time::Duration::ZERO).await.unwrap(), 1);
    assert_eq!(engine.store().received("idle.jpg", 2).await.unwrap().received(), 0);
    assert!(engine.artifact_path("done.jpg").exists());
}
