//! `gazetteer seed` — write the base reference entities (roads, POIs,
//! anchors) and a synthetic corpus of noisy address variants into the
//! configured database, so `run`/`evaluate` have something to chew on
//! without a real upstream feed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gazetteer_core::config::Config;
use gazetteer_core::model::AddressRecord;
use gazetteer_db::{init_database, Pool, PoolConfig, SqliteRepository};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::utils::{create_progress_bar, success, info as print_info, SPARKLE};

#[derive(Parser)]
pub struct SeedArgs {
    /// Run configuration JSON (db_path, weights, thresholds, ...).
    #[arg(short, long, default_value = "data/config.default.json")]
    pub config: PathBuf,

    /// Number of distinct physical entities to synthesize.
    #[arg(long, default_value_t = 30)]
    pub n_entities: usize,

    /// Number of noisy text variants per entity.
    #[arg(long, default_value_t = 5)]
    pub variants: usize,

    /// RNG seed, for a reproducible corpus.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}

/// One "real" physical entity the generator draws noisy variants from.
struct Entity {
    aoi: &'static str,
    building: &'static str,
    floor: &'static str,
    room: &'static str,
    road: &'static str,
    road_no: &'static str,
    shop: &'static str,
    lat: f64,
    lon: f64,
}

const AOIS: &[&str] = &["高新创新园", "蜀峰广场", "百盛山甄选自助餐厅-城南店", "创新园"];
const BUILDINGS: &[&str] = &["F9A", "F9B", "A12", "B7", "5#", "3#"];
const FLOORS: &[&str] = &["1", "2", "3", "4", "5"];
const ROOMS: &[&str] = &["101", "203", "305", "508", "1203"];
const ROADS: &[&str] = &["创新大道", "科学大道", "文昌路"];
const ROAD_NOS: &[&str] = &["66", "88", "110", "120", "188"];
const SHOPS: &[&str] = &["惠康大药房", "益康大药房", "便利店", "咖啡馆", "自助餐厅"];
const SOURCES: &[&str] = &["gaode", "manual", "crm", "delivery", "network_grid", "poi"];

pub async fn execute(args: SeedArgs) -> Result<()> {
    print_info(&format!("{}Seeding synthetic corpus", SPARKLE));

    let cfg = Config::load(&args.config).with_context(|| format!("loading {}", args.config.display()))?;

    let pool = Pool::new(PoolConfig::builder().db_path(cfg.db_path.clone()).build())
        .await
        .context("opening database")?;
    init_database(&pool).await.context("running migrations")?;
    let repo = SqliteRepository::new(&pool);

    seed_reference_data(&repo).await?;

    let (records, labels) = generate_address_records(args.n_entities, args.variants, args.seed);

    let pb = create_progress_bar(records.len() as u64, "Writing address records");
    for rec in &records {
        repo.upsert_record(rec).await.context("upserting record")?;
        pb.inc(1);
    }
    pb.finish_with_message("records written");

    for (rid1, rid2, label) in &labels {
        repo.insert_pair_label(rid1, rid2, *label).await.context("inserting pair label")?;
    }

    info!(n_records = records.len(), n_labels = labels.len(), db_path = %cfg.db_path, "seed complete");
    success(&format!("Inserted {} records and {} pair labels into {}", records.len(), labels.len(), cfg.db_path));
    print_info("Next: gazetteer run --config data/config.default.json");

    Ok(())
}

/// Roads, POIs, and anchors used by the candidate index and anchor
/// resolver — the knowledge base the synthetic records are drawn against.
async fn seed_reference_data(repo: &SqliteRepository) -> Result<()> {
    repo.upsert_road("r1", "创新大道", Some("蜀山区"), &["创新大街".to_string(), "Chuangxin Ave".to_string()])
        .await?;
    repo.upsert_road("r2", "科学大道", Some("蜀山区"), &["KeXue Ave".to_string()]).await?;
    repo.upsert_road("r3", "天波路", Some("蜀山区"), &["Tianbo Rd".to_string()]).await?;
    repo.upsert_road("r4", "文昌路", Some("蜀山区"), &[]).await?;
    repo.upsert_road("r5", "永乐北路", Some("蜀山区"), &["永乐北街".to_string()]).await?;

    repo.upsert_poi(
        "p1",
        "高新创新园",
        Some("AOI"),
        Some("蜀山区"),
        31.8200,
        117.1299,
        &["创新园".to_string(), "合肥高新创新园".to_string(), "高新区创新园".to_string()],
    )
    .await?;
    repo.upsert_poi(
        "p2",
        "蜀峰广场",
        Some("AOI"),
        Some("蜀山区"),
        31.8160,
        117.1250,
        &["蜀峰广场一期".to_string(), "蜀峰广场(一期)".to_string(), "蜀峰广场·一期".to_string()],
    )
    .await?;
    repo.upsert_poi(
        "p3",
        "名儒学校中学部",
        Some("POI"),
        Some("蜀山区"),
        31.8120,
        117.1320,
        &["名儒学校".to_string(), "名儒中学部".to_string()],
    )
    .await?;

    use gazetteer_core::model::Anchor;
    repo.upsert_anchor(&Anchor {
        anchor_id: "a1".to_string(),
        anchor_type: Some("intersection".to_string()),
        key_text: "天波路|科学大道".to_string(),
        district: Some("蜀山区".to_string()),
        lat: 31.8204,
        lon: 117.1292,
    })
    .await?;
    repo.upsert_anchor(&Anchor {
        anchor_id: "a2".to_string(),
        anchor_type: Some("intersection".to_string()),
        key_text: "文昌路|永乐北路".to_string(),
        district: Some("蜀山区".to_string()),
        lat: 31.8115,
        lon: 117.1330,
    })
    .await?;
    repo.upsert_anchor(&Anchor {
        anchor_id: "a3".to_string(),
        anchor_type: Some("poi".to_string()),
        key_text: "名儒学校中学部".to_string(),
        district: Some("蜀山区".to_string()),
        lat: 31.8120,
        lon: 117.1320,
    })
    .await?;

    Ok(())
}

fn variant_text(rng: &mut StdRng, e: &Entity) -> String {
    let floor_cn = match e.floor {
        "1" => "一",
        "2" => "二",
        "3" => "三",
        "4" => "四",
        _ => "五",
    };
    let floor_style = [
        format!("{}楼", e.floor),
        format!("{}层", e.floor),
        format!("{}楼", floor_cn),
        format!("{}层", floor_cn),
    ]
    .choose(rng)
    .unwrap()
    .clone();
    let room_style = [format!("{}室", e.room), format!("房{}", e.room), e.room.to_string()]
        .choose(rng)
        .unwrap()
        .clone();
    let building_style = [e.building.to_string(), format!("{}栋", e.building), format!("{}号楼", e.building)]
        .choose(rng)
        .unwrap()
        .clone();
    let aoi_style = if e.aoi == "蜀峰广场" {
        [e.aoi.to_string(), format!("{}一期", e.aoi)].choose(rng).unwrap().clone()
    } else {
        e.aoi.to_string()
    };
    let inter = [
        "（科学大道与天波路交口西北40米）",
        "（文昌路与永乐北路交叉口东南60米）",
        "（名儒学校中学部东侧110米）",
        "",
    ]
    .choose(rng)
    .unwrap();

    let mut shop_style = e.shop.to_string();
    if matches!(e.shop, "惠康大药房" | "益康大药房") && rng.gen_bool(0.3) {
        shop_style = ["惠康大药房", "益康大药房"].choose(rng).unwrap().to_string();
    }
    if e.aoi.starts_with("百盛山") && rng.gen_bool(0.5) {
        shop_style = ["百盛山海鲜", "百盛山甄选自助餐厅-城南店"].choose(rng).unwrap().to_string();
    }

    let templates = [
        format!(
            "合肥市蜀山区{}{}号 {} {} {} {} {}{}",
            e.road, e.road_no, aoi_style, building_style, floor_style, room_style, shop_style, inter
        ),
        format!(
            "安徽省合肥市蜀山区{}{}{}{}（{}{}号附近）{}{}",
            aoi_style, building_style, floor_style, room_style, e.road, e.road_no, shop_style, inter
        ),
        format!(
            "合肥蜀山区 {} {} {} {} {}{}",
            e.road, building_style, floor_style, room_style, shop_style, inter
        ),
    ];
    templates.choose(rng).unwrap().clone()
}

/// Reproduces `simulate.py`'s `generate_address_records`: `n_entities`
/// "real" locations, each rendered into `variants_per_entity` noisy text
/// forms, with a balanced positive/negative set of ground-truth pair labels.
fn generate_address_records(
    n_entities: usize,
    variants_per_entity: usize,
    seed: u64,
) -> (Vec<AddressRecord>, Vec<(String, String, u8)>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let base_lat = 31.8200;
    let base_lon = 117.1299;

    let entities: Vec<Entity> = (0..n_entities)
        .map(|_| Entity {
            aoi: AOIS.choose(&mut rng).unwrap(),
            building: BUILDINGS.choose(&mut rng).unwrap(),
            floor: FLOORS.choose(&mut rng).unwrap(),
            room: ROOMS.choose(&mut rng).unwrap(),
            road: ROADS.choose(&mut rng).unwrap(),
            road_no: ROAD_NOS.choose(&mut rng).unwrap(),
            shop: SHOPS.choose(&mut rng).unwrap(),
            lat: base_lat + rng.gen_range(-0.01..0.01),
            lon: base_lon + rng.gen_range(-0.01..0.01),
        })
        .collect();

    let mut records = Vec::new();
    let mut entity_rids: Vec<Vec<String>> = Vec::new();
    let mut rid_counter = 0usize;

    for e in &entities {
        let mut rids = Vec::with_capacity(variants_per_entity);
        for _ in 0..variants_per_entity {
            rid_counter += 1;
            let rid = format!("rid{:04}", rid_counter);
            let raw = variant_text(&mut rng, e);
            let lat = e.lat + rng.gen_range(-0.0002..0.0002);
            let lon = e.lon + rng.gen_range(-0.0002..0.0002);
            let grid = if rng.gen_bool(0.08) { "瑶海区" } else { "蜀山区" };
            records.push(AddressRecord {
                rid: rid.clone(),
                source: SOURCES.choose(&mut rng).unwrap().to_string(),
                raw_address: raw,
                district_claim: Some("蜀山区".to_string()),
                grid_district: Some(grid.to_string()),
                lat: Some(lat),
                lon: Some(lon),
                extra: Default::default(),
            });
            rids.push(rid);
        }
        entity_rids.push(rids);
    }

    let mut labels: Vec<(String, String, u8)> = Vec::new();
    for rids in &entity_rids {
        for i in 0..rids.len() {
            for j in (i + 1)..rids.len() {
                labels.push((rids[i].clone(), rids[j].clone(), 1));
            }
        }
    }

    let all_rids: Vec<&String> = entity_rids.iter().flatten().collect();
    let n_positive = labels.len();
    let mut attempts = 0usize;
    while labels.len() < n_positive * 2 && attempts < n_positive * 10 {
        attempts += 1;
        let a = all_rids.choose(&mut rng).unwrap();
        let b = all_rids.choose(&mut rng).unwrap();
        if a == b {
            continue;
        }
        let same_cluster = entity_rids.iter().any(|g| g.contains(a) && g.contains(b));
        if !same_cluster {
            labels.push(((*a).clone(), (*b).clone(), 0));
        }
    }

    labels.shuffle(&mut rng);
    (records, labels)
}
