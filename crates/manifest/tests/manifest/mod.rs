use std::time::Duration;

use iori_manifest::{
    AdaptationType, Decipherability, Manifest, ManifestEvent, ManifestOptions, MediaError,
    MediaErrorCode, SupplementaryImageTrack, SupplementaryTextTrack,
};

use crate::{
    common::{build, events, load, manifest_with, period, period_ids, LIVE, VOD},
    AssertWrapper,
};

#[test]
#[allow(deprecated)]
fn test_construction_sorts_periods() {
    let manifest = build(load(VOD));
    assert_eq!(period_ids(manifest.periods()), vec!["main", "credits"]);
    assert!(manifest.id().starts_with("gen-manifest-"));
    assert_eq!(manifest.transport, "dash");
    assert!(manifest.content_warnings().is_empty());
    assert_eq!(
        manifest.get_url(),
        Some("https://cdn.example.com/vod/manifest.mpd")
    );

    let adaptations = manifest.adaptations();
    let first = manifest.periods()[0].read();
    assert_eq!(first.end, Some(100.));
    assert_eq!(adaptations, first.adaptations);

    let video = &first.get_adaptations_for_type(AdaptationType::Video)[0];
    let bitrates: Vec<u64> = video.representations.iter().map(|r| r.bitrate).collect();
    assert_eq!(bitrates, vec![2_500_000, 5_000_000]);
}

#[test]
#[allow(deprecated)]
fn test_empty_manifest() {
    let manifest = build(manifest_with(vec![]));
    assert!(manifest.periods().is_empty());
    assert!(manifest.adaptations().is_empty());
    assert!(manifest.get_adaptations().is_empty());
    assert!(manifest.get_period_for_time(0.).is_none());
    assert!(manifest.get_next_period(0.).is_none());
    assert!(manifest.get_period("main").is_none());
}

#[test]
fn test_warnings_are_aggregated_in_order() {
    let mut unsupported = period("unsupported", 10., Some(10.));
    unsupported
        .adaptations
        .get_mut(&AdaptationType::Video)
        .assert_success()[0]
        .representations[0]
        .codecs = Some("hev1.1.6.L93.B0".to_string());

    let parsed = manifest_with(vec![
        period("negative", 0., Some(-1.)),
        unsupported,
        period("fine", 20., Some(10.)),
    ]);
    let options = ManifestOptions::new().codec_support(|_, mime| !mime.contains("hev1"));
    let manifest = Manifest::new(parsed, &options);

    let codes: Vec<MediaErrorCode> = manifest
        .content_warnings()
        .iter()
        .map(|warning| warning.code)
        .collect();
    assert_eq!(
        codes,
        vec![
            MediaErrorCode::ManifestParseError,
            MediaErrorCode::ManifestIncompatibleCodecsError
        ]
    );
    assert_eq!(manifest.periods().len(), 3);
}

#[test]
fn test_no_warning_without_duration() {
    let mut parsed = manifest_with(vec![period("live", 0., None)]);
    parsed.is_live = true;
    parsed.is_dynamic = true;
    assert!(build(parsed.clone()).content_warnings().is_empty());

    parsed.is_live = false;
    parsed.is_dynamic = false;
    assert!(build(parsed).content_warnings().is_empty());
}

#[test]
fn test_period_queries() {
    let manifest = build(load(VOD));
    let main = manifest.get_period("main").assert_success();
    let credits = manifest.get_period("credits").assert_success();

    assert!(manifest
        .get_period_for_time(50.)
        .assert_success()
        .ptr_eq(&main));
    assert!(manifest
        .get_period_for_time(100.)
        .assert_success()
        .ptr_eq(&credits));
    manifest.get_period_for_time(120.).assert_error();
    manifest.get_period_for_time(-1.).assert_error();

    assert!(manifest.get_next_period(50.).assert_success().ptr_eq(&credits));
    manifest.get_next_period(100.).assert_error();

    assert!(manifest
        .get_period_after(&main)
        .assert_success()
        .ptr_eq(&credits));
    manifest.get_period_after(&credits).assert_error();

    let live = build(load(LIVE));
    let open = live.get_period("p3").assert_success();
    assert_eq!(open.end(), None);
    live.get_period_after(&open).assert_error();
}

#[test]
fn test_segments_through_the_manifest() {
    let manifest = build(load(VOD));
    let main = manifest.get_period("main").assert_success();
    let credits = manifest.get_period("credits").assert_success();
    let main = main.read();
    let representation = main
        .get_adaptation("main-video")
        .assert_success()
        .get_representation("main-1080p")
        .assert_success();

    let index = &representation.index;
    assert_eq!(index.get_type(), "timeline");
    assert_eq!(index.get_first_position(), Some(0.));
    assert_eq!(index.get_last_position(), Some(100.));
    let segments = index.get_segments(20., 15.);
    let times: Vec<f64> = segments.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![1_800_000., 2_700_000.]);
    assert_eq!(index.scale(segments[0].time), 20.);
    assert_eq!(
        segments[0].media_urls,
        vec!["https://cdn.example.com/vod/main-1080p/1800000.m4s".to_string()]
    );

    let credits = credits.read();
    let index = &credits
        .get_adaptation("credits-video")
        .assert_success()
        .representations[0]
        .index;
    assert_eq!(index.get_type(), "template");
    assert_eq!(index.get_first_position(), Some(100.));
    let segments = index.get_segments(100., 8.);
    let numbers: Vec<Option<u64>> = segments.iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![Some(1), Some(2)]);
    assert_eq!(
        segments[1].media_urls,
        vec!["https://cdn.example.com/vod/credits-720p/00002.m4s".to_string()]
    );
    assert_eq!(index.get_segments(100., 100.).len(), 5);
}

#[test]
fn test_representation_filter() {
    let options =
        ManifestOptions::new().representation_filter(|representation, context| {
            context.buffer_type != AdaptationType::Video || representation.bitrate < 3_000_000
        });
    let manifest = Manifest::new(load(VOD), &options);
    let main = manifest.periods()[0].read();
    let video = main.get_adaptation("main-video").assert_success();
    assert_eq!(video.representations.len(), 1);
    assert_eq!(video.representations[0].id, "main-720p");
    assert_eq!(main.get_adaptations_for_type(AdaptationType::Audio).len(), 2);
}

#[test]
fn test_supplementary_tracks() {
    let options = ManifestOptions::new()
        .image_track(SupplementaryImageTrack {
            mime_type: "application/bif".to_string(),
            url: "https://cdn.example.com/vod/thumbnails.bif".to_string(),
        })
        .text_track(SupplementaryTextTrack {
            mime_type: "text/vtt".to_string(),
            codecs: None,
            url: "https://cdn.example.com/vod/subtitles.vtt".to_string(),
            language: "en".to_string(),
            closed_caption: true,
        })
        .codec_support(|r#type, _| r#type != AdaptationType::Image);
    let manifest = Manifest::new(load(VOD), &options);

    assert_eq!(
        manifest.content_warnings(),
        &[MediaError::new(
            MediaErrorCode::ManifestIncompatibleCodecsError,
            "An Adaptation contains only incompatible codecs."
        )]
    );

    let main = manifest.periods()[0].read();
    let image = &main.get_adaptations_for_type(AdaptationType::Image)[0];
    assert!(image.id.starts_with("gen-image-ada-"));
    assert!(image.manually_added);
    assert!(!image.is_supported);
    assert!(image.representations[0].id.starts_with("gen-image-rep-"));
    assert_eq!(image.representations[0].index.get_type(), "static");
    assert_eq!(
        image.representations[0].index.get_segments(0., 10.)[0].media_urls,
        vec!["https://cdn.example.com/vod/thumbnails.bif".to_string()]
    );

    let text = &main.get_adaptations_for_type(AdaptationType::Text)[0];
    assert!(text.id.starts_with("gen-text-ada-"));
    assert_eq!(text.language.as_deref(), Some("en"));
    assert!(text.is_closed_caption);
    assert!(text.is_supported);

    let credits = manifest.periods()[1].read();
    assert!(credits
        .get_adaptations_for_type(AdaptationType::Image)
        .is_empty());
}

#[test]
#[allow(deprecated)]
fn test_deprecated_accessors_read_first_period() {
    let manifest = build(load(VOD));
    assert_eq!(manifest.get_adaptations().len(), 3);
    assert_eq!(
        manifest.get_adaptations_for_type(AdaptationType::Audio).len(),
        2
    );
    assert!(manifest
        .get_adaptations_for_type(AdaptationType::Text)
        .is_empty());
    assert!(manifest.get_adaptation("main-audio-fr").assert_success().is_dub);
    manifest.get_adaptation("credits-video").assert_error();
}

#[test]
fn test_position_extrapolation() {
    let live = build(load(LIVE));
    let first = live.get_maximum_safe_position();
    let first_live = live.get_live_position().assert_success();
    std::thread::sleep(Duration::from_millis(50));
    let second = live.get_maximum_safe_position();
    let second_live = live.get_live_position().assert_success();

    assert!(first >= 25.);
    assert!(second - first >= 0.045);
    assert!(second_live - first_live >= 0.045);
    assert!(first_live >= 27.);

    let vod = build(load(VOD));
    let first = vod.get_maximum_safe_position();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(vod.get_maximum_safe_position(), first);
    assert_eq!(first, 120.);
    assert_eq!(vod.get_live_position(), None);
}

#[test]
fn test_minimum_position_floor() {
    let mut parsed = manifest_with(vec![]);
    parsed.time_bounds.timeshift_depth = Some(30.);
    parsed.time_bounds.minimum_safe_position = Some(80.);
    assert_eq!(build(parsed.clone()).get_minimum_safe_position(), 80.);

    parsed.time_bounds.minimum_safe_position = Some(10.);
    assert_eq!(build(parsed.clone()).get_minimum_safe_position(), 70.);

    parsed.time_bounds.minimum_safe_position = None;
    parsed.time_bounds.timeshift_depth = Some(500.);
    assert_eq!(build(parsed).get_minimum_safe_position(), 0.);
}

#[test]
fn test_decipherability_update_is_idempotent() {
    let mut manifest = build(load(VOD));
    let mut receiver = manifest.subscribe();

    manifest.update_representations_decipherability(|_| Decipherability::Decipherable);
    let received = events(&mut receiver);
    assert_eq!(received.len(), 1);
    match &received[0] {
        ManifestEvent::DecipherabilityUpdate(updates) => {
            assert_eq!(updates.len(), 5);
            assert!(updates.iter().all(|update| update.manifest_id == manifest.id()
                && update.decipherable == Decipherability::Decipherable));
            assert!(updates[0].period.ptr_eq(&manifest.periods()[0]));
        }
        event => panic!("unexpected event {event:?}"),
    }

    manifest.update_representations_decipherability(|_| Decipherability::Decipherable);
    assert!(events(&mut receiver).is_empty());
}

#[test]
fn test_decipherability_callback_reads_periods() {
    let mut manifest = build(load(VOD));
    let held = manifest.periods().to_vec();
    let mut receiver = manifest.subscribe();

    let mut calls = 0;
    manifest.update_representations_decipherability(|representation| {
        calls += 1;
        let owner = held
            .iter()
            .find(|period| period.read().contains_time(0.))
            .assert_success();
        assert!(owner.end().is_some());
        if representation.id == "main-720p" {
            Decipherability::NotDecipherable
        } else {
            representation.decipherable
        }
    });

    assert_eq!(calls, 5);
    let received = events(&mut receiver);
    let [ManifestEvent::DecipherabilityUpdate(updates)] = received.as_slice() else {
        panic!("unexpected events {received:?}");
    };
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].representation_id, "main-720p");
    assert!(updates[0].period.ptr_eq(&held[0]));
}

#[test]
fn test_undecipherable_key_ids() -> anyhow::Result<()> {
    let mut manifest = build(load(VOD));
    let mut receiver = manifest.subscribe();
    let key_id = hex::decode("00112233445566778899aabbccddeeff")?;

    manifest.add_undecipherable_key_ids(&[key_id.clone()]);
    let received = events(&mut receiver);
    let [ManifestEvent::DecipherabilityUpdate(updates)] = received.as_slice() else {
        panic!("unexpected events {received:?}");
    };
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].representation_id, "main-1080p");
    assert_eq!(updates[0].adaptation_id, "main-video");
    assert_eq!(updates[0].adaptation_type, AdaptationType::Video);
    assert_eq!(updates[0].decipherable, Decipherability::NotDecipherable);

    {
        let main = manifest.periods()[0].read();
        let video = main.get_adaptation("main-video").assert_success();
        let playable: Vec<&str> = video
            .get_playable_representations()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(playable, vec!["main-720p"]);
        assert_eq!(video.get_available_bitrates(), vec![2_500_000]);
    }

    manifest.add_undecipherable_key_ids(&[key_id]);
    assert!(events(&mut receiver).is_empty());
    Ok(())
}

#[test]
fn test_availability_start_date() {
    let live = build(load(LIVE));
    let date = live.availability_start_date().assert_success();
    assert_eq!(date.timestamp(), 1_700_000_000);
    build(manifest_with(vec![])).availability_start_date().assert_error();
}
