use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE TABLE "mirror_events" (
                "id" bigserial PRIMARY KEY,
                "topic_id" varchar NOT NULL,
                "sequence_number" bigint NOT NULL,
                "consensus_timestamp" varchar NOT NULL,
                "running_hash" varchar NOT NULL,
                "raw_message" text NOT NULL,
                "payload" jsonb,
                "message_type" varchar,
                "lot_id" varchar,
                "order_id" varchar,
                "proof_type" varchar,
                "submitted_by" varchar,
                "created_at" timestamptz NOT NULL DEFAULT now(),
                CONSTRAINT "uq_mirror_events_topic_sequence" UNIQUE ("topic_id", "sequence_number")
            );

            CREATE TABLE "topic_cursors" (
                "topic_id" varchar PRIMARY KEY,
                "last_sequence" bigint NOT NULL,
                "updated_at" timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE "idempotency_records" (
                "key" varchar PRIMARY KEY,
                "body_hash" varchar NOT NULL,
                "path" varchar NOT NULL,
                "method" varchar NOT NULL,
                "response_body" text NOT NULL,
                "status_code" smallint NOT NULL,
                "user_id" varchar,
                "created_at" timestamptz NOT NULL DEFAULT now(),
                "expires_at" timestamptz NOT NULL
            );

            CREATE INDEX "idx_idempotency_records_expires_at" ON "idempotency_records" ("expires_at");

            CREATE TABLE "orders" (
                "id" varchar PRIMARY KEY,
                "status" varchar,
                "last_event_type" varchar,
                "mirror_event_id" bigint,
                "mirror_consensus_timestamp" varchar,
                "updated_at" timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE "carbon_lots" (
                "id" varchar PRIMARY KEY,
                "status" varchar,
                "last_event_type" varchar,
                "mirror_event_id" bigint,
                "mirror_consensus_timestamp" varchar,
                "updated_at" timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE "proofs" (
                "id" bigserial PRIMARY KEY,
                "lot_id" varchar NOT NULL,
                "proof_type" varchar NOT NULL,
                "confirmed" boolean NOT NULL DEFAULT false,
                "mirror_event_id" bigint,
                "mirror_consensus_timestamp" varchar,
                "updated_at" timestamptz NOT NULL DEFAULT now(),
                CONSTRAINT "uq_proofs_lot_type" UNIQUE ("lot_id", "proof_type")
            );

            CREATE TABLE "analytics_events" (
                "id" bigserial PRIMARY KEY,
                "metric" varchar NOT NULL,
                "metadata" jsonb NOT NULL,
                "created_at" timestamptz NOT NULL DEFAULT now()
            );

            COMMENT ON TABLE "mirror_events" IS 'Append-only log of messages consumed from mirror node topics';

            COMMENT ON TABLE "topic_cursors" IS 'Last processed sequence number per monitored topic'
        "#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            DROP TABLE "analytics_events";
            DROP TABLE "proofs";
            DROP TABLE "carbon_lots";
            DROP TABLE "orders";
            DROP TABLE "idempotency_records";
            DROP TABLE "topic_cursors";
            DROP TABLE "mirror_events"
        "#;

        crate::from_sql(manager, sql).await
    }
}
