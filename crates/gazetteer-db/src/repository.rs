//! `SqliteRepository`: the concrete [`gazetteer_core::repository::Repository`]
//! this crate ships, plus the write-side helpers the CLI's `seed` command
//! uses to populate reference data (roads, POIs, anchors, pair labels).

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use gazetteer_core::error::{CoreError, CoreResult};
use gazetteer_core::model::{AddressRecord, Anchor, Cluster, Conflict, MatchResult, ParsedAddress};
use gazetteer_core::repository::{MatchLogEntry, Repository};

use crate::error::{DbError, DbResult};
use crate::pool::Pool;
use crate::transaction::TransactionManager;

fn to_core<T>(result: DbResult<T>) -> CoreResult<T> {
    result.map_err(|e| CoreError::Collaborator(e.to_string()))
}

/// SQLite-backed implementation of the engine's `Repository` seam.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: &Pool) -> Self {
        SqliteRepository {
            pool: pool.inner().clone(),
        }
    }

    /// Insert or replace a raw address record (used by `seed`/`import`).
    pub async fn upsert_record(&self, record: &AddressRecord) -> DbResult<()> {
        let extra_json = serde_json::to_string(&record.extra)?;
        sqlx::query(
            r#"
            INSERT INTO address_records (rid, source, raw_address, district_claim, grid_district, lat, lon, extra_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(rid) DO UPDATE SET
                source = excluded.source,
                raw_address = excluded.raw_address,
                district_claim = excluded.district_claim,
                grid_district = excluded.grid_district,
                lat = excluded.lat,
                lon = excluded.lon,
                extra_json = excluded.extra_json
            "#,
        )
        .bind(&record.rid)
        .bind(&record.source)
        .bind(&record.raw_address)
        .bind(&record.district_claim)
        .bind(&record.grid_district)
        .bind(record.lat)
        .bind(record.lon)
        .bind(extra_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a road reference row, used to seed the alias/canonicalization tables.
    pub async fn upsert_road(&self, road_id: &str, name: &str, district: Option<&str>, aliases: &[String]) -> DbResult<()> {
        let aliases_json = serde_json::to_string(aliases)?;
        sqlx::query(
            r#"
            INSERT INTO roads (road_id, name, district, aliases_json)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(road_id) DO UPDATE SET name = excluded.name, district = excluded.district, aliases_json = excluded.aliases_json
            "#,
        )
        .bind(road_id)
        .bind(name)
        .bind(district)
        .bind(aliases_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a point-of-interest reference row.
    pub async fn upsert_poi(
        &self,
        poi_id: &str,
        name: &str,
        poi_type: Option<&str>,
        district: Option<&str>,
        lat: f64,
        lon: f64,
        aliases: &[String],
    ) -> DbResult<()> {
        let aliases_json = serde_json::to_string(aliases)?;
        sqlx::query(
            r#"
            INSERT INTO pois (poi_id, name, poi_type, district, lat, lon, aliases_json)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(poi_id) DO UPDATE SET
                name = excluded.name, poi_type = excluded.poi_type, district = excluded.district,
                lat = excluded.lat, lon = excluded.lon, aliases_json = excluded.aliases_json
            "#,
        )
        .bind(poi_id)
        .bind(name)
        .bind(poi_type)
        .bind(district)
        .bind(lat)
        .bind(lon)
        .bind(aliases_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert an anchor (intersection or named POI) keyed by its lookup text.
    pub async fn upsert_anchor(&self, anchor: &Anchor) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO anchors (anchor_id, anchor_type, key_text, district, lat, lon)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(key_text) DO UPDATE SET
                anchor_id = excluded.anchor_id, anchor_type = excluded.anchor_type,
                district = excluded.district, lat = excluded.lat, lon = excluded.lon
            "#,
        )
        .bind(&anchor.anchor_id)
        .bind(&anchor.anchor_type)
        .bind(&anchor.key_text)
        .bind(&anchor.district)
        .bind(anchor.lat)
        .bind(anchor.lon)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a human-labeled ground-truth pair, used by `gazetteer evaluate`.
    pub async fn insert_pair_label(&self, rid1: &str, rid2: &str, label: u8) -> DbResult<()> {
        sqlx::query("INSERT INTO pair_labels (rid1, rid2, label) VALUES (?, ?, ?)")
            .bind(rid1)
            .bind(rid2)
            .bind(label as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> DbResult<AddressRecord> {
    let extra_json: Option<String> = row.try_get("extra_json")?;
    let extra = match extra_json {
        Some(s) if !s.is_empty() => serde_json::from_str(&s)?,
        _ => Default::default(),
    };
    Ok(AddressRecord {
        rid: row.try_get("rid")?,
        source: row.try_get("source")?,
        raw_address: row.try_get("raw_address")?,
        district_claim: row.try_get("district_claim")?,
        grid_district: row.try_get("grid_district")?,
        lat: row.try_get("lat")?,
        lon: row.try_get("lon")?,
        extra,
    })
}

fn row_to_parsed(row: &sqlx::sqlite::SqliteRow) -> DbResult<ParsedAddress> {
    let intersection_json: Option<String> = row.try_get("intersection_json")?;
    let intersection = match intersection_json {
        Some(s) if !s.is_empty() => Some(serde_json::from_str(&s)?),
        _ => None,
    };
    Ok(ParsedAddress {
        norm_text: row.try_get("norm_text")?,
        province: row.try_get("province")?,
        city: row.try_get("city")?,
        district: row.try_get("district")?,
        street: row.try_get("street")?,
        road: row.try_get("road")?,
        road_no: row.try_get("road_no")?,
        aoi: row.try_get("aoi")?,
        building: row.try_get("building")?,
        unit: row.try_get("unit")?,
        floor: row.try_get("floor")?,
        room: row.try_get("room")?,
        shop_name: row.try_get("shop_name")?,
        intersection,
        direction: row.try_get("direction")?,
        distance_m: row.try_get("distance_m")?,
    })
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn list_records(&self) -> CoreResult<Vec<AddressRecord>> {
        to_core(async {
            let rows = sqlx::query("SELECT * FROM address_records ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(row_to_record).collect::<DbResult<Vec<_>>>()
        }.await)
    }

    async fn get_record(&self, rid: &str) -> CoreResult<Option<AddressRecord>> {
        to_core(async {
            let row = sqlx::query("SELECT * FROM address_records WHERE rid = ?")
                .bind(rid)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(row_to_record).transpose()
        }.await)
    }

    async fn get_parsed(&self, rid: &str) -> CoreResult<Option<ParsedAddress>> {
        to_core(async {
            let row = sqlx::query("SELECT * FROM parsed_addresses WHERE rid = ?")
                .bind(rid)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(row_to_parsed).transpose()
        }.await)
    }

    async fn upsert_parsed(&self, rid: &str, parsed: &ParsedAddress) -> CoreResult<()> {
        to_core(async {
            let intersection_json = match &parsed.intersection {
                Some(pair) => Some(serde_json::to_string(pair)?),
                None => None,
            };
            sqlx::query(
                r#"
                INSERT INTO parsed_addresses (
                    rid, norm_text, province, city, district, street, road, road_no,
                    aoi, building, unit, floor, room, shop_name, intersection_json,
                    direction, distance_m
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(rid) DO UPDATE SET
                    norm_text = excluded.norm_text, province = excluded.province, city = excluded.city,
                    district = excluded.district, street = excluded.street, road = excluded.road,
                    road_no = excluded.road_no, aoi = excluded.aoi, building = excluded.building,
                    unit = excluded.unit, floor = excluded.floor, room = excluded.room,
                    shop_name = excluded.shop_name, intersection_json = excluded.intersection_json,
                    direction = excluded.direction, distance_m = excluded.distance_m
                "#,
            )
            .bind(rid)
            .bind(&parsed.norm_text)
            .bind(&parsed.province)
            .bind(&parsed.city)
            .bind(&parsed.district)
            .bind(&parsed.street)
            .bind(&parsed.road)
            .bind(&parsed.road_no)
            .bind(&parsed.aoi)
            .bind(&parsed.building)
            .bind(&parsed.unit)
            .bind(&parsed.floor)
            .bind(&parsed.room)
            .bind(&parsed.shop_name)
            .bind(intersection_json)
            .bind(&parsed.direction)
            .bind(parsed.distance_m)
            .execute(&self.pool)
            .await?;
            Ok(())
        }.await)
    }

    async fn insert_conflicts(&self, conflicts: &[Conflict]) -> CoreResult<()> {
        to_core(async {
            let conflicts = conflicts.to_vec();
            TransactionManager::new(self.pool.clone())
                .execute(move |tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>| {
                    Box::pin(async move {
                        for c in &conflicts {
                            sqlx::query("INSERT INTO conflicts (rid, conflict_type, detail) VALUES (?, ?, ?)")
                                .bind(&c.rid)
                                .bind(&c.conflict_type)
                                .bind(&c.detail)
                                .execute(&mut *tx)
                                .await?;
                        }
                        Ok(())
                    })
                })
                .await
        }.await)
    }

    async fn insert_match_log(&self, entry: &MatchLogEntry) -> CoreResult<()> {
        to_core(async {
            let candidate_rids_json = serde_json::to_string(&entry.candidate_rids)?;
            let pre_scores_json = serde_json::to_string(&entry.pre_scores)?;
            let final_json = serde_json::to_string(&entry.final_result)?;
            sqlx::query(
                "INSERT INTO match_logs (rid_query, candidate_rids_json, pre_scores_json, final_json) VALUES (?, ?, ?, ?)",
            )
            .bind(&entry.rid_query)
            .bind(candidate_rids_json)
            .bind(pre_scores_json)
            .bind(final_json)
            .execute(&self.pool)
            .await?;
            Ok(())
        }.await)
    }

    async fn write_clusters(&self, clusters: &[Cluster]) -> CoreResult<()> {
        to_core(async {
            let clusters = clusters.to_vec();
            TransactionManager::new(self.pool.clone())
                .execute(move |tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>| {
                    Box::pin(async move {
                        sqlx::query("DELETE FROM clusters").execute(&mut *tx).await?;
                        for cluster in &clusters {
                            for rid in &cluster.members {
                                sqlx::query("INSERT INTO clusters (cluster_id, rid) VALUES (?, ?)")
                                    .bind(&cluster.cluster_id)
                                    .bind(rid)
                                    .execute(&mut *tx)
                                    .await?;
                            }
                        }
                        Ok(())
                    })
                })
                .await
        }.await)
    }

    async fn find_anchor_by_key(&self, key_text: &str) -> CoreResult<Option<Anchor>> {
        to_core(async {
            let row = sqlx::query_as::<_, crate::models::AnchorRow>(
                "SELECT * FROM anchors WHERE key_text = ?",
            )
            .bind(key_text)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(|r| Anchor {
                anchor_id: r.anchor_id,
                anchor_type: r.anchor_type,
                key_text: r.key_text,
                district: r.district,
                lat: r.lat,
                lon: r.lon,
            }))
        }.await)
    }

    async fn list_pair_labels(&self) -> CoreResult<Vec<(String, String, u8)>> {
        to_core(async {
            let rows = sqlx::query("SELECT rid1, rid2, label FROM pair_labels")
                .fetch_all(&self.pool)
                .await?;
            rows.iter()
                .map(|row| -> DbResult<(String, String, u8)> {
                    let label: i64 = row.try_get("label")?;
                    Ok((row.try_get("rid1")?, row.try_get("rid2")?, label as u8))
                })
                .collect()
        }.await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{default_migrations, MigrationManager};

    async fn fresh_repo() -> SqliteRepository {
        let pool = Pool::in_memory().await.unwrap();
        let manager = MigrationManager::new(&pool);
        manager.migrate(&default_migrations()).await.unwrap();
        SqliteRepository::new(&pool)
    }

    #[tokio::test]
    async fn upserts_and_reads_back_a_record() {
        let repo = fresh_repo().await;
        let record = AddressRecord::ad_hoc("r1", "合肥市蜀山区黄山路");
        repo.upsert_record(&record).await.unwrap();
        let fetched = repo.get_record("r1").await.unwrap().unwrap();
        assert_eq!(fetched.raw_address, record.raw_address);
    }

    #[tokio::test]
    async fn upsert_parsed_then_get_round_trips_intersection() {
        let repo = fresh_repo().await;
        repo.upsert_record(&AddressRecord::ad_hoc("r1", "x")).await.unwrap();
        let mut parsed = ParsedAddress::unparsed("x");
        parsed.intersection = Some(("科学大道".to_string(), "天波路".to_string()));
        repo.upsert_parsed("r1", &parsed).await.unwrap();
        let fetched = repo.get_parsed("r1").await.unwrap().unwrap();
        assert_eq!(fetched.intersection, parsed.intersection);
    }

    #[tokio::test]
    async fn find_anchor_by_key_matches_seeded_row() {
        let repo = fresh_repo().await;
        let anchor = Anchor {
            anchor_id: "a1".to_string(),
            anchor_type: Some("intersection".to_string()),
            key_text: "科学大道&天波路".to_string(),
            district: Some("蜀山区".to_string()),
            lat: 31.8,
            lon: 117.2,
        };
        repo.upsert_anchor(&anchor).await.unwrap();
        let found = repo.find_anchor_by_key("科学大道&天波路").await.unwrap();
        assert_eq!(found.unwrap().anchor_id, "a1");
    }

    #[tokio::test]
    async fn write_clusters_replaces_previous_membership() {
        let repo = fresh_repo().await;
        repo.write_clusters(&[Cluster {
            cluster_id: "c1".to_string(),
            members: vec!["r1".to_string(), "r2".to_string()],
        }])
        .await
        .unwrap();
        repo.write_clusters(&[Cluster {
            cluster_id: "c2".to_string(),
            members: vec!["r3".to_string()],
        }])
        .await
        .unwrap();
        let rows = sqlx::query("SELECT cluster_id FROM clusters")
            .fetch_all(&repo.pool)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn list_pair_labels_returns_inserted_rows() {
        let repo = fresh_repo().await;
        repo.insert_pair_label("r1", "r2", 1).await.unwrap();
        repo.insert_pair_label("r1", "r3", 0).await.unwrap();
        let labels = repo.list_pair_labels().await.unwrap();
        assert_eq!(labels.len(), 2);
    }
}
