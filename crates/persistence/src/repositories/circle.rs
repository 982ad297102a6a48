//! Circle repository: circles, memberships and invite codes.

use domain::models::CircleRole;
use domain::services::invite_code::MAX_CODE_ATTEMPTS;
use domain::services::membership::{check_leave, outcome_after_leave};
use domain::services::{LeaveOutcome, LeaveRejection};
use sqlx::PgPool;
use tracing::warn;

use crate::entities::{
    CircleEntity, CircleMemberEntity, CircleRoleDb, CircleWithMembershipEntity,
    MemberWithUserEntity,
};
use crate::metrics::QueryTimer;

/// Result of a leave attempt that reached the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveResult {
    NotMember,
    Rejected(LeaveRejection),
    Done(LeaveOutcome),
}

/// Returns true for PostgreSQL unique violations (23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

/// Repository for circle-related database operations.
#[derive(Clone)]
pub struct CircleRepository {
    pool: PgPool,
}

impl CircleRepository {
    /// Creates a new CircleRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a circle and make its creator the first admin, in one transaction.
    ///
    /// Invite codes come from `generate_code`; a code already taken is
    /// skipped and a new one drawn, up to `MAX_CODE_ATTEMPTS` times.
    pub async fn create_circle<F>(
        &self,
        name: &str,
        patient_name: &str,
        created_by: i64,
        display_name: &str,
        generate_code: F,
    ) -> Result<CircleEntity, sqlx::Error>
    where
        F: Fn() -> String,
    {
        let timer = QueryTimer::new("create_circle");
        let mut tx = self.pool.begin().await?;

        let mut created = None;
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_code();
            let circle = sqlx::query_as::<_, CircleEntity>(
                r#"
                INSERT INTO circles (name, patient_name, code, created_by)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT ON CONSTRAINT circles_code_key DO NOTHING
                RETURNING id, name, patient_name, code, created_by, created_at, updated_at
                "#,
            )
            .bind(name)
            .bind(patient_name)
            .bind(&code)
            .bind(created_by)
            .fetch_optional(&mut *tx)
            .await?;

            if circle.is_some() {
                created = circle;
                break;
            }
            warn!(attempt, "Invite code collision, drawing a new code");
        }

        let Some(circle) = created else {
            return Err(sqlx::Error::Protocol(
                "Failed to generate unique invite code".into(),
            ));
        };

        sqlx::query(
            r#"
            INSERT INTO circle_members (circle_id, user_id, role, display_name)
            VALUES ($1, $2, 'admin', $3)
            "#,
        )
        .bind(circle.id)
        .bind(created_by)
        .bind(display_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(circle)
    }

    /// Find a circle by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<CircleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_circle_by_id");
        let result = sqlx::query_as::<_, CircleEntity>(
            r#"
            SELECT id, name, patient_name, code, created_by, created_at, updated_at
            FROM circles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a circle by its (normalized) invite code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<CircleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_circle_by_code");
        let result = sqlx::query_as::<_, CircleEntity>(
            r#"
            SELECT id, name, patient_name, code, created_by, created_at, updated_at
            FROM circles
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Get a user's membership in a circle.
    pub async fn get_membership(
        &self,
        circle_id: i64,
        user_id: i64,
    ) -> Result<Option<CircleMemberEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_circle_membership");
        let result = sqlx::query_as::<_, CircleMemberEntity>(
            r#"
            SELECT id, circle_id, user_id, role, display_name, joined_at
            FROM circle_members
            WHERE circle_id = $1 AND user_id = $2
            "#,
        )
        .bind(circle_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Add a member to a circle.
    ///
    /// An existing membership fails with a unique violation; a circle that
    /// no longer exists fails with a foreign key violation.
    pub async fn add_member(
        &self,
        circle_id: i64,
        user_id: i64,
        role: CircleRole,
        display_name: &str,
    ) -> Result<CircleMemberEntity, sqlx::Error> {
        let timer = QueryTimer::new("add_circle_member");
        let result = sqlx::query_as::<_, CircleMemberEntity>(
            r#"
            INSERT INTO circle_members (circle_id, user_id, role, display_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, circle_id, user_id, role, display_name, joined_at
            "#,
        )
        .bind(circle_id)
        .bind(user_id)
        .bind(CircleRoleDb::from(role))
        .bind(display_name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Remove a user's membership, deleting the circle if nobody is left.
    ///
    /// The circle row is locked for the duration so concurrent leaves on the
    /// same circle see each other's effects when counting admins.
    pub async fn leave_circle(
        &self,
        circle_id: i64,
        user_id: i64,
    ) -> Result<LeaveResult, sqlx::Error> {
        let timer = QueryTimer::new("leave_circle");
        let mut tx = self.pool.begin().await?;

        let locked: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM circles WHERE id = $1 FOR UPDATE")
                .bind(circle_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(LeaveResult::NotMember);
        }

        let role: Option<(CircleRoleDb,)> = sqlx::query_as(
            "SELECT role FROM circle_members WHERE circle_id = $1 AND user_id = $2",
        )
        .bind(circle_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((role,)) = role else {
            return Ok(LeaveResult::NotMember);
        };

        let (admin_count, member_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE role = 'admin'), COUNT(*)
            FROM circle_members
            WHERE circle_id = $1
            "#,
        )
        .bind(circle_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Err(rejection) = check_leave(role.into(), admin_count, member_count) {
            return Ok(LeaveResult::Rejected(rejection));
        }

        sqlx::query("DELETE FROM circle_members WHERE circle_id = $1 AND user_id = $2")
            .bind(circle_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let (remaining,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM circle_members WHERE circle_id = $1")
                .bind(circle_id)
                .fetch_one(&mut *tx)
                .await?;

        let outcome = outcome_after_leave(remaining);
        if outcome == LeaveOutcome::CircleDeleted {
            sqlx::query("DELETE FROM circles WHERE id = $1")
                .bind(circle_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(LeaveResult::Done(outcome))
    }

    /// All circles a user belongs to, most recently joined first.
    pub async fn list_user_circles(
        &self,
        user_id: i64,
    ) -> Result<Vec<CircleWithMembershipEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_user_circles");
        let result = sqlx::query_as::<_, CircleWithMembershipEntity>(
            r#"
            SELECT
                c.id, c.name, c.patient_name, c.code, c.created_by, c.created_at, c.updated_at,
                cm.role, cm.display_name, cm.joined_at,
                u.name AS creator_name, u.email AS creator_email
            FROM circles c
            JOIN circle_members cm ON cm.circle_id = c.id
            JOIN users u ON u.id = c.created_by
            WHERE cm.user_id = $1
            ORDER BY cm.joined_at DESC, c.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// One circle as seen by one of its members.
    pub async fn find_user_circle(
        &self,
        circle_id: i64,
        user_id: i64,
    ) -> Result<Option<CircleWithMembershipEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_circle");
        let result = sqlx::query_as::<_, CircleWithMembershipEntity>(
            r#"
            SELECT
                c.id, c.name, c.patient_name, c.code, c.created_by, c.created_at, c.updated_at,
                cm.role, cm.display_name, cm.joined_at,
                u.name AS creator_name, u.email AS creator_email
            FROM circles c
            JOIN circle_members cm ON cm.circle_id = c.id
            JOIN users u ON u.id = c.created_by
            WHERE c.id = $1 AND cm.user_id = $2
            "#,
        )
        .bind(circle_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Members of a circle with their accounts, in join order.
    pub async fn list_members(
        &self,
        circle_id: i64,
    ) -> Result<Vec<MemberWithUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_circle_members");
        let result = sqlx::query_as::<_, MemberWithUserEntity>(
            r#"
            SELECT
                cm.id, cm.user_id, cm.role, cm.display_name, cm.joined_at,
                u.name AS user_name, u.email AS user_email
            FROM circle_members cm
            JOIN users u ON u.id = cm.user_id
            WHERE cm.circle_id = $1
            ORDER BY cm.joined_at ASC, cm.id ASC
            "#,
        )
        .bind(circle_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Rename a circle. `None` keeps the current value.
    pub async fn update_circle(
        &self,
        circle_id: i64,
        name: Option<&str>,
        patient_name: Option<&str>,
    ) -> Result<Option<CircleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_circle");
        let result = sqlx::query_as::<_, CircleEntity>(
            r#"
            UPDATE circles
            SET name = COALESCE($2, name),
                patient_name = COALESCE($3, patient_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, patient_name, code, created_by, created_at, updated_at
            "#,
        )
        .bind(circle_id)
        .bind(name)
        .bind(patient_name)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replace a circle's invite code with a fresh unused one.
    pub async fn regenerate_code<F>(
        &self,
        circle_id: i64,
        generate_code: F,
    ) -> Result<Option<CircleEntity>, sqlx::Error>
    where
        F: Fn() -> String,
    {
        let timer = QueryTimer::new("regenerate_circle_code");

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_code();
            let result = sqlx::query_as::<_, CircleEntity>(
                r#"
                UPDATE circles
                SET code = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING id, name, patient_name, code, created_by, created_at, updated_at
                "#,
            )
            .bind(circle_id)
            .bind(&code)
            .fetch_optional(&self.pool)
            .await;

            match result {
                Err(e) if is_unique_violation(&e) => {
                    warn!(attempt, circle_id, "Invite code collision, drawing a new code");
                }
                other => {
                    timer.record();
                    return other;
                }
            }
        }

        Err(sqlx::Error::Protocol(
            "Failed to generate unique invite code".into(),
        ))
    }
}
