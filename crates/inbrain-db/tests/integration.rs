//! Offline tests for inbrain-db pool configuration and row mapping.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use chrono::Utc;
use inbrain_core::{
    AppConfig, Cluster, Comment, Environment, Import, LinkCount, Platform, Sentiment,
};
use inbrain_db::{ClusterLinkCountRow, ClusterRow, CommentRow, ImportRow, PoolConfig};
use uuid::Uuid;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        clusterer_api_key: None,
        clusterer_base_url: "http://localhost".to_string(),
        clusterer_model: "model".to_string(),
        clusterer_timeout_secs: 60,
        clusterer_max_retries: 3,
        clusterer_backoff_base_ms: 1000,
        cluster_schedule: None,
    }
}

fn cluster_row() -> ClusterRow {
    ClusterRow {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        theme: Some("Gear questions".to_string()),
        summary: None,
        comment_count: Some(4),
        sample_comments: serde_json::json!(["what mic?", "which camera?"]),
        content_ideas: serde_json::json!([{"title": "Gear tour", "content_type": "video"}]),
        primary_platform: Some("youtube".to_string()),
        platforms: vec!["youtube".to_string(), "tiktok".to_string()],
        import_ids: vec![],
        is_active: true,
        created_at: Utc::now() - chrono::Duration::hours(2),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout, Duration::from_secs(9));
}

#[test]
fn pool_config_keeps_minimum_within_maximum() {
    let mut config = app_config();
    config.db_max_connections = 0;
    config.db_min_connections = 5;
    let pool_config = PoolConfig::from_app_config(&config);
    assert_eq!(pool_config.max_connections, 1);
    assert_eq!(pool_config.min_connections, 1);
}

#[test]
fn cluster_row_maps_to_domain_cluster() {
    let cluster = Cluster::from(cluster_row());
    assert_eq!(cluster.theme, "Gear questions");
    assert_eq!(cluster.comment_count, 4);
    assert_eq!(cluster.sample_comments, vec!["what mic?", "which camera?"]);
    assert_eq!(cluster.content_ideas.len(), 1);
    assert_eq!(cluster.content_ideas[0].content_type.as_deref(), Some("video"));
    assert_eq!(cluster.primary_platform, Some(Platform::Youtube));
    assert_eq!(cluster.platforms, vec![Platform::Youtube, Platform::Tiktok]);
}

#[test]
fn cluster_row_keeps_both_timestamps() {
    let row = cluster_row();
    let cluster = Cluster::from(row.clone());
    assert_eq!(cluster.created_at, row.created_at);
    assert_eq!(cluster.updated_at, row.updated_at);
    assert!(cluster.updated_at > cluster.created_at);
}

#[test]
fn link_count_row_maps_platform_and_import() {
    let import_id = Uuid::new_v4();
    let link = LinkCount::from(ClusterLinkCountRow {
        cluster_id: Uuid::new_v4(),
        platform: "TikTok".to_string(),
        import_id: Some(import_id),
        comment_count: 3,
    });
    assert_eq!(link.platform, Platform::Tiktok);
    assert_eq!(link.import_id, Some(import_id));
    assert_eq!(link.count, 3);
}

#[test]
fn cluster_row_sanitizes_missing_and_malformed_values() {
    let row = ClusterRow {
        theme: None,
        comment_count: None,
        sample_comments: serde_json::json!(["ok", 7, null]),
        content_ideas: serde_json::json!({"not": "an array"}),
        primary_platform: Some("myspace".to_string()),
        platforms: vec!["friendster".to_string()],
        ..cluster_row()
    };

    let cluster = Cluster::from(row);
    assert_eq!(cluster.theme, "");
    assert_eq!(cluster.comment_count, 0);
    assert_eq!(cluster.sample_comments, vec!["ok"]);
    assert!(cluster.content_ideas.is_empty());
    assert_eq!(cluster.primary_platform, Some(Platform::Other));
    assert_eq!(cluster.platforms, vec![Platform::Other]);
}

#[test]
fn comment_row_maps_platform_and_sentiment() {
    let row = CommentRow {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        platform: "Instagram".to_string(),
        content: "how do you edit?".to_string(),
        author_name: None,
        author_handle: None,
        post_url: None,
        post_title: None,
        sentiment: Some("question".to_string()),
        import_id: None,
        cluster_id: None,
        is_processed: false,
        original_date: None,
        created_at: Utc::now(),
    };

    let comment = Comment::from(row);
    assert_eq!(comment.platform, Platform::Instagram);
    assert_eq!(comment.sentiment, Some(Sentiment::Question));
}

#[test]
fn import_row_clamps_negative_counts() {
    let row = ImportRow {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: "Launch video".to_string(),
        platform: "youtube".to_string(),
        comment_count: -3,
        created_at: Utc::now(),
    };

    let import = Import::from(row);
    assert_eq!(import.comment_count, 0);
    assert_eq!(import.platform, Platform::Youtube);
}
