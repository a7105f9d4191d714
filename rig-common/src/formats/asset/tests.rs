//! Tests for whole-asset encoding

use super::*;
use crate::formats::{
    ActionRecord, BoneRecord, BoneTrs, ChunkTag, NO_PARENT, SkinVertex, StringRef, read_chunks,
    write_chunk,
};

const IDENTITY_3X4: [f32; 12] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];

fn two_bone_builder() -> AssetBuilder {
    let mut builder = AssetBuilder::new();
    let root = builder.write_string("Root").unwrap();
    let arm = builder.write_string("Arm").unwrap();
    builder
        .push_bone(BoneRecord::new(root, NO_PARENT, IDENTITY_3X4))
        .unwrap();
    builder
        .push_bone(BoneRecord::new(arm, 0, IDENTITY_3X4))
        .unwrap();
    builder
}

fn vertex(weight: f32) -> SkinVertex {
    SkinVertex {
        position: [0.0, 1.0, 0.0],
        normal: [0.0, 0.0, 1.0],
        color: SkinVertex::DEFAULT_COLOR,
        parameter: SkinVertex::DEFAULT_PARAMETER,
        weights: [weight, 0.0, 0.0, 0.0],
        bone_indices: [1, 0, 0, 0],
    }
}

#[test]
fn test_empty_asset_has_five_empty_chunks() {
    let bytes = AssetBuilder::new().to_bytes().unwrap();
    assert_eq!(bytes.len(), 40);

    let tags: Vec<_> = read_chunks(&bytes)
        .unwrap()
        .iter()
        .map(|c| c.magic)
        .collect();
    assert_eq!(tags, [*b"str0", *b"bon0", *b"frm0", *b"act0", *b"msh0"]);
}

#[test]
fn test_full_asset_roundtrip() {
    let mut builder = two_bone_builder();
    for _ in 0..3 {
        builder
            .push_frame(&[BoneTrs::IDENTITY, BoneTrs::IDENTITY])
            .unwrap();
    }
    let walk = builder.write_string("Walk!local").unwrap();
    builder.push_action(ActionRecord::new(walk, 0, 3)).unwrap();
    builder.push_vertices(&[vertex(1.0), vertex(1.0), vertex(1.0)]);

    let bytes = builder.to_bytes().unwrap();
    assert_eq!(bytes.len(), builder.summary().total());

    let asset = DecodedAsset::parse(&bytes).unwrap();
    assert_eq!(asset.bone_name(0), Some("Root"));
    assert_eq!(asset.bone_name(1), Some("Arm"));
    assert_eq!(asset.bones[1].parent, 0);
    assert_eq!(asset.frame_count(), 3);
    assert_eq!(asset.frame(2).unwrap().len(), 2);
    assert!(asset.frame(3).is_none());
    assert_eq!(asset.action_name(0), Some("Walk!local"));
    assert_eq!(asset.find_action("Walk!local").unwrap().frame_count(), 3);
    assert_eq!(asset.find_bone("Arm"), Some(1));
    assert_eq!(asset.vertices.len(), 3);
}

#[test]
fn test_summary_sizes() {
    let mut builder = two_bone_builder();
    builder
        .push_frame(&[BoneTrs::IDENTITY, BoneTrs::IDENTITY])
        .unwrap();
    let summary = builder.summary();
    assert_eq!(summary.strings, 7);
    assert_eq!(summary.bones, 120);
    assert_eq!(summary.frames, 80);
    assert_eq!(summary.total(), 40 + 7 + 120 + 80);
}

#[test]
fn test_frame_must_match_bone_count() {
    let mut builder = two_bone_builder();
    assert!(builder.push_frame(&[BoneTrs::IDENTITY]).is_err());
    assert_eq!(builder.frame_count(), 0);
}

#[test]
fn test_parent_must_precede_child() {
    let mut builder = AssetBuilder::new();
    let name = builder.write_string("Orphan").unwrap();
    assert!(
        builder
            .push_bone(BoneRecord::new(name, 0, IDENTITY_3X4))
            .is_err()
    );
}

#[test]
fn test_no_bones_after_frames() {
    let mut builder = two_bone_builder();
    builder
        .push_frame(&[BoneTrs::IDENTITY, BoneTrs::IDENTITY])
        .unwrap();
    let name = builder.write_string("Late").unwrap();
    assert!(
        builder
            .push_bone(BoneRecord::new(name, NO_PARENT, IDENTITY_3X4))
            .is_err()
    );
}

#[test]
fn test_action_must_stay_inside_frame_stream() {
    let mut builder = two_bone_builder();
    builder
        .push_frame(&[BoneTrs::IDENTITY, BoneTrs::IDENTITY])
        .unwrap();
    let name = builder.write_string("Idle!local").unwrap();
    assert!(builder.push_action(ActionRecord::new(name, 0, 2)).is_err());
    assert!(builder.push_action(ActionRecord::new(name, 0, 1)).is_ok());
}

#[test]
fn test_parse_rejects_wrong_order() {
    let builder = AssetBuilder::new();
    let mut out = Vec::new();
    for tag in [
        ChunkTag::Bones,
        ChunkTag::Strings,
        ChunkTag::Frames,
        ChunkTag::Actions,
        ChunkTag::Mesh,
    ] {
        write_chunk(&mut out, tag, &builder.chunk_payload(tag)).unwrap();
    }
    assert!(DecodedAsset::parse(&out).is_err());
}

#[test]
fn test_parse_rejects_partial_records() {
    let mut out = Vec::new();
    for tag in ChunkTag::ORDER {
        let payload: &[u8] = if tag == ChunkTag::Actions { &[0; 15] } else { &[] };
        write_chunk(&mut out, tag, payload).unwrap();
    }
    assert!(DecodedAsset::parse(&out).is_err());
}

#[test]
fn test_parse_rejects_missing_chunk() {
    let bytes = two_bone_builder().to_bytes().unwrap();
    let chunks = read_chunks(&bytes).unwrap();
    let truncated_len = bytes.len() - (8 + chunks[4].payload.len());
    assert!(DecodedAsset::parse(&bytes[..truncated_len]).is_err());
}

#[test]
fn test_frame_index_past_end_of_address_space() {
    let asset = DecodedAsset {
        bones: vec![BoneRecord::new(StringRef::default(), NO_PARENT, IDENTITY_3X4)],
        frames: vec![BoneTrs::IDENTITY],
        ..DecodedAsset::default()
    };
    assert!(asset.frame(0).is_some());
    assert!(asset.frame(usize::MAX).is_none());
}
