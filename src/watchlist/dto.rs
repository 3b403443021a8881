use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AddMovieRequest {
    #[serde(rename = "movieId")]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
}
