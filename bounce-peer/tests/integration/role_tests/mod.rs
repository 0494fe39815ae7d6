mod test_client_tracks_the_ball;
mod test_invalid_geometry_is_fatal;
mod test_invalid_media_config_is_fatal;
mod test_server_offers_and_honours_bye;
