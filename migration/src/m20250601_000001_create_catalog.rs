use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(string(Movie::Title))
                    .col(text_null(Movie::Synopsis))
                    .col(string(Movie::ReleaseDate))
                    .col(boolean(Movie::InTheaters))
                    .col(string_null(Movie::Poster))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_release_date")
                    .table(Movie::Table)
                    .col(Movie::ReleaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(pk_auto(Genre::Id))
                    .col(string(Genre::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actor::Table)
                    .if_not_exists()
                    .col(pk_auto(Actor::Id))
                    .col(string(Actor::Name))
                    .col(string(Actor::BirthDate))
                    .col(string_null(Actor::Photo))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Venue::Table)
                    .if_not_exists()
                    .col(pk_auto(Venue::Id))
                    .col(string(Venue::Name))
                    .col(double(Venue::Latitude))
                    .col(double(Venue::Longitude))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieGenre::Table)
                    .if_not_exists()
                    .col(integer(MovieGenre::MovieId))
                    .col(integer(MovieGenre::GenreId))
                    .primary_key(
                        Index::create().col(MovieGenre::MovieId).col(MovieGenre::GenreId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genre_movie")
                            .from(MovieGenre::Table, MovieGenre::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genre_genre")
                            .from(MovieGenre::Table, MovieGenre::GenreId)
                            .to(Genre::Table, Genre::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieActor::Table)
                    .if_not_exists()
                    .col(integer(MovieActor::MovieId))
                    .col(integer(MovieActor::ActorId))
                    .col(string(MovieActor::Character))
                    .col(integer(MovieActor::BillingOrder))
                    .primary_key(
                        Index::create().col(MovieActor::MovieId).col(MovieActor::ActorId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actor_movie")
                            .from(MovieActor::Table, MovieActor::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actor_actor")
                            .from(MovieActor::Table, MovieActor::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieVenue::Table)
                    .if_not_exists()
                    .col(integer(MovieVenue::MovieId))
                    .col(integer(MovieVenue::VenueId))
                    .primary_key(
                        Index::create().col(MovieVenue::MovieId).col(MovieVenue::VenueId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_venue_movie")
                            .from(MovieVenue::Table, MovieVenue::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_venue_venue")
                            .from(MovieVenue::Table, MovieVenue::VenueId)
                            .to(Venue::Table, Venue::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(pk_auto(Rating::Id))
                    .col(integer(Rating::MovieId))
                    .col(string(Rating::ViewerId))
                    .col(integer(Rating::Score))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_movie")
                            .from(Rating::Table, Rating::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rating_unique")
                    .table(Rating::Table)
                    .col(Rating::MovieId)
                    .col(Rating::ViewerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rating_movie")
                    .table(Rating::Table)
                    .col(Rating::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Rating::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieVenue::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieActor::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieGenre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Venue::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actor::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Title,
    Synopsis,
    ReleaseDate,
    InTheaters,
    Poster,
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Actor {
    Table,
    Id,
    Name,
    BirthDate,
    Photo,
}

#[derive(DeriveIden)]
enum Venue {
    Table,
    Id,
    Name,
    Latitude,
    Longitude,
}

#[derive(DeriveIden)]
enum MovieGenre {
    Table,
    MovieId,
    GenreId,
}

#[derive(DeriveIden)]
enum MovieActor {
    Table,
    MovieId,
    ActorId,
    Character,
    BillingOrder,
}

#[derive(DeriveIden)]
enum MovieVenue {
    Table,
    MovieId,
    VenueId,
}

#[derive(DeriveIden)]
enum Rating {
    Table,
    Id,
    MovieId,
    ViewerId,
    Score,
}
