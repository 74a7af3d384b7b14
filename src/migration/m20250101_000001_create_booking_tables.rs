use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).text().not_null().unique_key())
                    .col(ColumnDef::new(Users::FullName).text().not_null())
                    .col(ColumnDef::new(Users::University).text().null())
                    .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Users::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sessions::MenteeId).uuid().not_null())
                    .col(ColumnDef::new(Sessions::MentorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Sessions::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sessions::Topic).text().not_null())
                    .col(ColumnDef::new(Sessions::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Sessions::RejectionReason).text().null())
                    .col(ColumnDef::new(Sessions::MeetingLink).text().null())
                    .col(ColumnDef::new(Sessions::MeetingId).text().null())
                    .col(ColumnDef::new(Sessions::MeetingPassword).text().null())
                    .col(
                        ColumnDef::new(Sessions::ReviewedByMentee)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Sessions::ReviewedByMentor)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_mentee")
                            .from(Sessions::Table, Sessions::MenteeId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_mentor")
                            .from(Sessions::Table, Sessions::MentorId)
                            .to(Users::Table, Users::Id),
                    )
                    .check(Expr::col(Sessions::StartTime).lt(Expr::col(Sessions::EndTime)))
                    .to_owned(),
            )
            .await?;

        // Conflict checks scan a mentor's sessions by status.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_mentor_status")
                    .table(Sessions::Table)
                    .col(Sessions::MentorId)
                    .col(Sessions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_mentee")
                    .table(Sessions::Table)
                    .col(Sessions::MenteeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AvailabilitySlots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AvailabilitySlots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AvailabilitySlots::MentorId).uuid().not_null())
                    .col(
                        ColumnDef::new(AvailabilitySlots::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_availability_slots_mentor")
                            .from(AvailabilitySlots::Table, AvailabilitySlots::MentorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_availability_slots_mentor_start")
                    .table(AvailabilitySlots::Table)
                    .col(AvailabilitySlots::MentorId)
                    .col(AvailabilitySlots::StartsAt)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AvailabilitySlots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    FullName,
    University,
    Role,
    IsApproved,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    MenteeId,
    MentorId,
    StartTime,
    EndTime,
    Topic,
    Status,
    RejectionReason,
    MeetingLink,
    MeetingId,
    MeetingPassword,
    ReviewedByMentee,
    ReviewedByMentor,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AvailabilitySlots {
    Table,
    Id,
    MentorId,
    StartsAt,
}
